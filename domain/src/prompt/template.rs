//! Prompt templates for the three council stages
//!
//! Pure functions: deterministic output for given inputs, no I/O. Stage 1
//! and 3 produce full message lists (system directive + content); stage 2
//! is a single user-role prompt so reviews stay independent of history.

use crate::conversation::entities::{ChatMessage, Message};
use crate::council::label::LabelMap;
use crate::council::opinion::ModelOpinion;
use crate::council::ranking::RankingSummary;
use crate::council::review::ReviewResult;
use std::fmt::Write as _;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System directive for stage 1.
    fn stage1_system() -> &'static str {
        r#"You are one member of a council of AI models convened to answer a user's question.
Answer the question directly and concisely in your own voice.
Do not speculate about the other members or address them; just give your best answer.
Support your points with reasoning where it helps, and stay on topic."#
    }

    /// Stage 1: system directive, prior conversation, then the new question.
    pub fn stage1_messages(history: &[ChatMessage], user_message: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(Self::stage1_system()));
        for entry in history {
            messages.push(Message {
                role: entry.role,
                content: entry.content.clone(),
            });
        }
        messages.push(Message::user(user_message));
        messages
    }

    /// Stage 2: one user-role prompt with the question, the anonymized
    /// opinions, and the exact ranking line format spelled out.
    pub fn stage2_messages(
        user_message: &str,
        labels: &LabelMap,
        opinions: &[ModelOpinion],
    ) -> Vec<Message> {
        let mut prompt = format!(
            "Original question: {}\n\n\
             Below are answers to that question from several anonymous models.\n\
             One of them is your own answer.\n\n\
             Answers to review:\n",
            user_message
        );

        for (label, model_id) in labels.iter() {
            if let Some(opinion) = opinions
                .iter()
                .find(|o| o.model_id == model_id && o.is_success())
            {
                let _ = write!(prompt, "\n--- Response {} ---\n{}\n", label, opinion.text);
            }
        }

        let _ = write!(
            prompt,
            "\nRank the responses from best to worst, judging accuracy, completeness, and clarity.\n\
             Output one line per response, best first, in exactly this form:\n\n\
             Rank 1: <label> — <one-sentence reasoning>\n\
             Rank 2: <label> — <one-sentence reasoning>\n\n\
             Use each label at most once and produce {} lines in total.\n\
             Omit the label that corresponds to your own response.",
            labels.len().saturating_sub(1).max(1)
        );

        vec![Message::user(prompt)]
    }

    /// System directive for stage 3.
    fn stage3_system() -> &'static str {
        r#"You are the chairman of a council of AI models.
The councilors have answered the user's question and reviewed each other's answers.
Synthesize a single final answer that integrates the strongest points, resolves
contradictions explicitly, and answers the user directly. Do not describe the
council process; just deliver the answer."#
    }

    /// Stage 3: chairman directive, prior conversation, then a digest of the
    /// question, the attributed opinions, and the aggregated ranking.
    pub fn stage3_messages(
        history: &[ChatMessage],
        user_message: &str,
        opinions: &[ModelOpinion],
        reviews: &[ReviewResult],
        ranking: &RankingSummary,
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(Self::stage3_system()));
        for entry in history {
            messages.push(Message {
                role: entry.role,
                content: entry.content.clone(),
            });
        }

        let mut prompt = format!("Original question: {}\n\nCouncil answers:\n", user_message);
        for opinion in opinions.iter().filter(|o| o.is_success()) {
            let _ = write!(prompt, "\n--- {} ---\n{}\n", opinion.model_id, opinion.text);
        }

        if !ranking.is_empty() {
            prompt.push_str("\nAggregated peer ranking (lower mean rank is better):\n");
            for (position, entry) in ranking.iter().enumerate() {
                let _ = writeln!(
                    prompt,
                    "{}. {} — mean rank {:.2} across {} reviewer(s)",
                    position + 1,
                    entry.model_id,
                    entry.mean_rank,
                    entry.reviewer_count
                );
            }
        } else if reviews.iter().any(|r| r.parse_ok) {
            prompt.push_str("\nPeer reviews produced no usable ranking.\n");
        } else {
            prompt.push_str("\nNo peer reviews are available for this question.\n");
        }

        prompt.push_str(
            "\nWrite the final answer for the user, integrating the strongest points above \
             and resolving any contradictions.",
        );

        messages.push(Message::user(prompt));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::entities::Role;

    fn labels2() -> LabelMap {
        LabelMap::new(["m1", "m2"].map(String::from))
    }

    #[test]
    fn test_stage1_shape() {
        let history = vec![
            ChatMessage::user("earlier question"),
            ChatMessage::assistant("earlier answer"),
        ];
        let messages = PromptTemplate::stage1_messages(&history, "What is 2+2?");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "earlier question");
        assert_eq!(messages[2].content, "earlier answer");
        assert_eq!(messages[3].role, Role::User);
        assert_eq!(messages[3].content, "What is 2+2?");
    }

    #[test]
    fn test_stage1_is_deterministic() {
        let a = PromptTemplate::stage1_messages(&[], "q");
        let b = PromptTemplate::stage1_messages(&[], "q");
        assert_eq!(a, b);
    }

    #[test]
    fn test_stage2_labels_and_no_model_names() {
        let opinions = vec![
            ModelOpinion::success("m1", "Answer one"),
            ModelOpinion::success("m2", "Answer two"),
        ];
        let messages = PromptTemplate::stage2_messages("The question", &labels2(), &opinions);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        let prompt = &messages[0].content;
        assert!(prompt.contains("Response A"));
        assert!(prompt.contains("Response B"));
        assert!(prompt.contains("Answer one"));
        assert!(prompt.contains("Rank 1: <label>"));
        // Anonymized: real ids must not leak into the review prompt.
        assert!(!prompt.contains("m1"));
        assert!(!prompt.contains("m2"));
    }

    #[test]
    fn test_stage2_skips_failed_opinions() {
        let labels = LabelMap::new(["m1"].map(String::from));
        let opinions = vec![
            ModelOpinion::success("m1", "only answer"),
            ModelOpinion::failure("m2", "timeout"),
        ];
        let messages = PromptTemplate::stage2_messages("q", &labels, &opinions);
        assert!(!messages[0].content.contains("timeout"));
    }

    #[test]
    fn test_stage3_attributes_and_ranks() {
        let opinions = vec![
            ModelOpinion::success("m1", "Four."),
            ModelOpinion::success("m2", "It is 4."),
        ];
        let reviews = vec![];
        let ranking = RankingSummary {
            entries: vec![crate::council::ranking::RankedModel {
                model_id: "m1".to_string(),
                mean_rank: 1.0,
                reviewer_count: 2,
            }],
        };
        let messages =
            PromptTemplate::stage3_messages(&[], "What is 2+2?", &opinions, &reviews, &ranking);

        assert_eq!(messages[0].role, Role::System);
        let prompt = &messages.last().unwrap().content;
        assert!(prompt.contains("--- m1 ---"));
        assert!(prompt.contains("--- m2 ---"));
        assert!(prompt.contains("mean rank 1.00 across 2 reviewer(s)"));
    }

    #[test]
    fn test_stage3_without_reviews() {
        let opinions = vec![ModelOpinion::success("m1", "Four.")];
        let messages = PromptTemplate::stage3_messages(
            &[],
            "q",
            &opinions,
            &[],
            &RankingSummary::default(),
        );
        let prompt = &messages.last().unwrap().content;
        assert!(prompt.contains("No peer reviews"));
    }
}
