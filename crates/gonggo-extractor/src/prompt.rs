//! Prompt construction for the model tiers

use gonggo_domain::{ExtractionResult, Field, FieldGroup};

/// Builds the focused prompt for one field group
pub struct GroupPromptBuilder<'a> {
    group: FieldGroup,
    fields: &'a [Field],
    text: &'a str,
}

impl<'a> GroupPromptBuilder<'a> {
    /// Create a builder for the missing `fields` of `group`
    pub fn new(group: FieldGroup, fields: &'a [Field], text: &'a str) -> Self {
        Self {
            group,
            fields,
            text,
        }
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(GROUP_INSTRUCTIONS);
        prompt.push_str("\n\n");
        prompt.push_str(&format!("Field group: {}\n\n", self.group));

        prompt.push_str("Fields to extract:\n");
        for field in self.fields {
            prompt.push_str(&format!(
                "- \"{}\": {} ({})\n",
                field.key(),
                field.description(),
                field.kind().format_hint()
            ));
        }
        prompt.push('\n');

        prompt.push_str("Announcement text:\n");
        prompt.push_str("---\n");
        prompt.push_str(self.text);
        prompt.push_str("\n---\n\n");

        prompt.push_str("Output format (one JSON object, no additional text):\n{");
        let keys: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("\"{}\": ...", f.key()))
            .collect();
        prompt.push_str(&keys.join(", "));
        prompt.push_str("}\n\n");
        prompt.push_str(GROUP_FORMAT_REMINDER);

        prompt
    }
}

/// Builds the full-document escalation prompt
pub struct FullDocumentPromptBuilder<'a> {
    text: &'a str,
    prior: Vec<&'a ExtractionResult>,
}

impl<'a> FullDocumentPromptBuilder<'a> {
    /// Create a builder over the document text
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            prior: Vec::new(),
        }
    }

    /// Show earlier tiers' values so the model can confirm or correct them
    ///
    /// Only value-bearing results are listed.
    pub fn with_prior_results(mut self, results: impl IntoIterator<Item = &'a ExtractionResult>) -> Self {
        self.prior.extend(results.into_iter().filter(|r| r.is_resolved()));
        self
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(FULL_DOCUMENT_INSTRUCTIONS);
        prompt.push_str("\n\n");

        if self.prior.is_empty() {
            prompt.push_str("Already extracted: nothing\n\n");
        } else {
            prompt.push_str("Already extracted (verify; correct if wrong):\n");
            for result in &self.prior {
                let value = result.value.as_ref().map(|v| v.display()).unwrap_or_default();
                prompt.push_str(&format!(
                    "- {}: {} [{}, {}, {}]\n",
                    result.field.key(),
                    value,
                    result.tier,
                    result.confidence,
                    result.source
                ));
            }
            prompt.push('\n');
        }

        prompt.push_str("All fields:\n");
        for group in FieldGroup::ALL {
            prompt.push_str(&format!("[{}]\n", group));
            for field in Field::in_group(group) {
                prompt.push_str(&format!(
                    "- \"{}\": {} ({})\n",
                    field.key(),
                    field.description(),
                    field.kind().format_hint()
                ));
            }
        }
        prompt.push('\n');

        prompt.push_str("Announcement text:\n");
        prompt.push_str("---\n");
        prompt.push_str(self.text);
        prompt.push_str("\n---\n\n");

        prompt.push_str(FULL_DOCUMENT_FORMAT);

        prompt
    }
}

const GROUP_INSTRUCTIONS: &str = r#"You are extracting structured data from a Korean government funding announcement (정부지원사업 공고문).
Read the announcement and fill in only the fields listed below.

Rules:
- Use only information stated in the text; do not guess
- If a field is not stated, use null
- Dates: the application period's start and end, not the announcement date
- Amounts: convert Korean units to whole won (5억원 = 500000000, 3천만원 = 30000000)
- Lists: short Korean tags, no duplicates"#;

const GROUP_FORMAT_REMINDER: &str =
    "Remember: Return ONLY a flat JSON object with exactly these keys, null for anything not found. No markdown, no explanations.";

const FULL_DOCUMENT_INSTRUCTIONS: &str = r#"Full-document review of a Korean government funding announcement (정부지원사업 공고문).
Earlier passes with regular expressions and a smaller model left gaps or produced uncertain values.
Read the whole document, extract every field you can, and correct earlier values that are wrong.

For each value that a regular expression should have found but did not, propose a pattern:
- the exact text around the value (context_snippet)
- a regular expression (Rust regex syntax) that would capture it (suggested_pattern)
- why a typical pattern would miss it (failure_reason)"#;

const FULL_DOCUMENT_FORMAT: &str = r#"Output format (one JSON object only, no additional text):
{
  "fields": {"<field key>": <value or null>, ...},
  "reasoning": "brief explanation of difficult fields",
  "pattern_suggestions": [
    {
      "field": "<field key>",
      "extracted_value": "value as found",
      "context_snippet": "surrounding text",
      "suggested_pattern": "regex",
      "failure_reason": "why existing patterns missed it"
    }
  ]
}

Remember: Return ONLY valid JSON, no markdown code blocks."#;

#[cfg(test)]
mod tests {
    use super::*;
    use gonggo_domain::{Confidence, FieldValue};

    #[test]
    fn test_group_prompt_lists_only_requested_fields() {
        let fields = [Field::Organization, Field::Contact];
        let prompt = GroupPromptBuilder::new(FieldGroup::A, &fields, "공고 본문").build();

        assert!(prompt.contains("Field group: A (Operations/Dates)"));
        assert!(prompt.contains("\"organization\""));
        assert!(prompt.contains("\"contact\""));
        assert!(!prompt.contains("\"deadline\""));
        assert!(prompt.contains("공고 본문"));
        assert!(prompt.contains("null"));
    }

    #[test]
    fn test_group_prompt_includes_format_hints() {
        let fields = [Field::BudgetAmount];
        let prompt = GroupPromptBuilder::new(FieldGroup::B, &fields, "").build();
        assert!(prompt.contains(Field::BudgetAmount.kind().format_hint()));
    }

    #[test]
    fn test_full_prompt_lists_every_field() {
        let prompt = FullDocumentPromptBuilder::new("본문").build();
        for field in Field::ALL {
            assert!(prompt.contains(&format!("\"{}\"", field.key())), "missing {}", field);
        }
        assert!(prompt.contains("Already extracted: nothing"));
        assert!(prompt.contains("pattern_suggestions"));
    }

    #[test]
    fn test_full_prompt_shows_prior_values() {
        let tier1 = ExtractionResult::tier1(
            Field::Region,
            FieldValue::Text("부산".to_string()),
            Confidence::High,
            "region.labeled",
        );
        let unresolved = ExtractionResult::tier2(Field::Contact, None, "small");

        let prompt = FullDocumentPromptBuilder::new("본문")
            .with_prior_results([&tier1, &unresolved])
            .build();

        assert!(prompt.contains("- region: 부산 [tier1"));
        assert!(prompt.contains("region.labeled"));
        assert!(!prompt.contains("- contact:"));
    }
}
