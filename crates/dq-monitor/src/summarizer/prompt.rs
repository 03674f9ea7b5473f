use crate::types::AnomalyReport;

/// System message sent with every summary request.
pub const SYSTEM_PROMPT: &str = "You are a data quality expert.";

/// User message asking for a short summary of `report`.
pub fn build_prompt(report: &AnomalyReport) -> serde_json::Result<String> {
    let rendered = serde_json::to_string_pretty(report)?;
    Ok(format!(
        "You are a senior data quality engineer.\n\
         Analyze the following dataset anomaly report and produce a short,\n\
         insightful summary:\n\
         {rendered}\n\n\
         Include:\n\
         - Key problems detected\n\
         - Possible causes\n\
         - Recommended next steps for data engineers\n\
         Keep it concise and professional.\n"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_report() {
        let mut report = AnomalyReport {
            duplicate_rows: 3,
            row_count: 10,
            column_count: 2,
            ..Default::default()
        };
        report.missing_values.insert("email".to_string(), 4);

        let prompt = build_prompt(&report).unwrap();

        assert!(prompt.starts_with("You are a senior data quality engineer."));
        assert!(prompt.contains("\"duplicate_rows\": 3"));
        assert!(prompt.contains("\"email\": 4"));
        assert!(prompt.contains("Recommended next steps for data engineers"));
        assert!(prompt.trim_end().ends_with("Keep it concise and professional."));
    }
}
