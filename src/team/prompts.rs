//! Stage prompts for each team.
//!
//! Prompt wording is domain content, not protocol: the pipeline only cares
//! that each stage gets a system prompt plus a user message carrying the
//! task and the upstream stage outputs.

use crate::config::TeamKey;
use crate::llm::Message;

/// System prompt for the creator stage.
pub fn creator_system_prompt(team: TeamKey) -> &'static str {
    match team {
        TeamKey::Coder => {
            "You are an expert software engineer. Implement the requested code.\n\
             Rules:\n\
             - Output the complete code, never elide sections\n\
             - Include error handling\n\
             - State the line count"
        }
        TeamKey::Auditor => {
            "You are an expert auditor and analyst. Examine the target in detail and report on:\n\
             1. Soundness of structure and design\n\
             2. Risks and problems\n\
             3. Suggested improvements\n\
             4. Overall score out of 100"
        }
        TeamKey::Data => {
            "You are a data processing specialist. Process the given data precisely,\n\
             preserve every value, and describe the transformations you applied."
        }
        TeamKey::Searcher => {
            "You are a research specialist. Answer the query with current, sourced\n\
             information and keep the summary concise."
        }
    }
}

/// System prompt for the checker stage.
pub fn checker_system_prompt(team: TeamKey) -> &'static str {
    match team {
        TeamKey::Coder => {
            "You are a code-review and destructive-testing expert. Evaluate on:\n\
             1. Bugs and vulnerabilities\n\
             2. Edge-case coverage\n\
             3. Performance problems\n\
             4. Readability and maintainability\n\
             5. Best-practice adherence\n\
             Score out of 100. If there are problems, propose concrete fixes."
        }
        TeamKey::Auditor => {
            "You are a devil's advocate. Hunt for holes in the analysis: missed risks,\n\
             unjustified conclusions, and blind spots. Score out of 100."
        }
        TeamKey::Data => {
            "You are a data-consistency checker. Verify that no values were lost or\n\
             corrupted and that the transformations are sound. Score out of 100."
        }
        TeamKey::Searcher => {
            "You are a fact checker. Verify the claims in the answer, flag anything\n\
             unsupported or stale, and score out of 100."
        }
    }
}

/// System prompt for the leader stage.
pub fn leader_system_prompt(team: TeamKey) -> &'static str {
    match team {
        TeamKey::Coder => {
            "You lead the coding team. Weigh the creator's code against the checker's\n\
             review and output the final code. Apply review points that are valid;\n\
             output the complete code, never elide sections."
        }
        TeamKey::Auditor => {
            "You lead the audit team. Combine the analysis and the counter-review into\n\
             the final audit report, resolving any disagreements yourself."
        }
        TeamKey::Data => {
            "You lead the data team. Confirm or correct the processed result based on\n\
             the consistency check and output the final data."
        }
        TeamKey::Searcher => {
            "You lead the search team. Merge the answer and the fact check into the\n\
             final, verified response."
        }
    }
}

/// Messages for the creator stage.
pub fn creator_messages(team: TeamKey, task: &str, context: &str) -> Vec<Message> {
    let user = if context.is_empty() {
        format!("Task: {task}")
    } else {
        format!("Task: {task}\n\nContext:\n{context}")
    };
    vec![Message::system(creator_system_prompt(team)), Message::user(user)]
}

/// Messages for the checker stage.
pub fn checker_messages(team: TeamKey, task: &str, creator_output: &str) -> Vec<Message> {
    vec![
        Message::system(checker_system_prompt(team)),
        Message::user(format!("Task: {task}\n\nCreator output:\n{creator_output}")),
    ]
}

/// Messages for the leader stage.
pub fn leader_messages(
    team: TeamKey,
    task: &str,
    creator_output: &str,
    checker_output: &str,
) -> Vec<Message> {
    vec![
        Message::system(leader_system_prompt(team)),
        Message::user(format!(
            "Task: {task}\n\nCreator output:\n{creator_output}\n\n\
             Checker review:\n{checker_output}\n\n\
             Produce the final result."
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creator_messages_without_context() {
        let messages = creator_messages(TeamKey::Coder, "write fizzbuzz", "");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Task: write fizzbuzz");
    }

    #[test]
    fn test_creator_messages_with_context() {
        let messages = creator_messages(TeamKey::Coder, "t", "previous attempt");
        assert!(messages[1].content.contains("Context:\nprevious attempt"));
    }

    #[test]
    fn test_leader_messages_carry_both_stage_outputs() {
        let messages = leader_messages(TeamKey::Data, "t", "created", "checked");
        assert!(messages[1].content.contains("Creator output:\ncreated"));
        assert!(messages[1].content.contains("Checker review:\nchecked"));
    }
}
