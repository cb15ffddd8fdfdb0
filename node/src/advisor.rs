// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Advisory suggestion generator.
//!
//! Calls an external text-generation service to produce prioritization and
//! reminder advice for a user's tasks. Purely advisory: the output never
//! touches task state, and the node works fine with the advisor disabled.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use taskanchor_core::task::Task;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("advisor is not configured on this node")]
    Disabled,

    #[error("advisor upstream error: {0}")]
    Upstream(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvisorReport {
    pub suggestions: String,
    pub parsed: ParsedAdvice,
}

/// Best-effort section split of the generated text. Sections the model did
/// not produce come back empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedAdvice {
    pub priorities: Vec<String>,
    pub reasoning: Vec<String>,
    pub timeframes: Vec<String>,
    pub dependencies: Vec<String>,
    pub risks: Vec<String>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    text: String,
}

#[derive(Debug, Clone)]
pub struct AdvisorClient {
    client: Client,
    base_url: Option<String>,
    model: String,
}

impl AdvisorClient {
    pub fn new(base_url: Option<String>, model: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            model,
        }
    }

    pub async fn analyze_priorities(
        &self,
        tasks: &[Task],
        preferences: &serde_json::Value,
    ) -> Result<AdvisorReport, AdvisorError> {
        let prompt = format!(
            "Analyze the following tasks and provide prioritization advice:\n\
             Tasks: {}\n\
             Current Date: {}\n\
             User Preferences: {}\n\n\
             Please provide:\n\
             1. Prioritized order of tasks\n\
             2. Reasoning for each priority\n\
             3. Suggested timeframes\n\
             4. Any potential dependencies between tasks\n\
             5. Risk factors to consider\n",
            serde_json::to_string(tasks).unwrap_or_default(),
            chrono::Utc::now().to_rfc3339(),
            preferences,
        );
        self.generate(prompt).await
    }

    pub async fn suggest_reminders(
        &self,
        task: &Task,
        preferences: &serde_json::Value,
    ) -> Result<AdvisorReport, AdvisorError> {
        let prompt = format!(
            "Based on the following task and context, suggest optimal reminder times:\n\
             Task: {}\n\
             Due Date: {}\n\
             Current Date: {}\n\
             User Preferences: {}\n\n\
             Provide:\n\
             1. Recommended reminder schedule\n\
             2. Reasoning for each reminder time\n\
             3. Suggestions for breaking down the task\n",
            serde_json::to_string(task).unwrap_or_default(),
            task.due.to_rfc3339(),
            chrono::Utc::now().to_rfc3339(),
            preferences,
        );
        self.generate(prompt).await
    }

    async fn generate(&self, prompt: String) -> Result<AdvisorReport, AdvisorError> {
        let base = self.base_url.as_deref().ok_or(AdvisorError::Disabled)?;
        let url = format!("{base}/v1/generate");
        let resp = self
            .client
            .post(&url)
            .json(&GenerateRequest { model: &self.model, prompt })
            .send()
            .await
            .map_err(|e| AdvisorError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AdvisorError::Upstream(format!("generate failed: {}", resp.status())));
        }

        let body: GenerateResponse = resp.json().await.map_err(|e| AdvisorError::Upstream(e.to_string()))?;
        Ok(AdvisorReport {
            parsed: parse_sections(&body.text),
            suggestions: body.text,
        })
    }
}

fn parse_sections(text: &str) -> ParsedAdvice {
    let mut sections = text.split("\n\n").map(|s| {
        s.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect::<Vec<_>>()
    });
    ParsedAdvice {
        priorities: sections.next().unwrap_or_default(),
        reasoning: sections.next().unwrap_or_default(),
        timeframes: sections.next().unwrap_or_default(),
        dependencies: sections.next().unwrap_or_default(),
        risks: sections.next().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_split_on_blank_lines() {
        let parsed = parse_sections("1. A\n2. B\n\nbecause\n\nsoon");
        assert_eq!(parsed.priorities, vec!["1. A", "2. B"]);
        assert_eq!(parsed.reasoning, vec!["because"]);
        assert_eq!(parsed.timeframes, vec!["soon"]);
        assert!(parsed.dependencies.is_empty());
    }

    #[tokio::test]
    async fn disabled_advisor_reports_itself() {
        let advisor = AdvisorClient::new(None, "m".to_string());
        let err = advisor.analyze_priorities(&[], &serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, AdvisorError::Disabled));
    }
}
