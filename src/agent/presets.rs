//! Preset Agents
//!
//! Fixed factories for the two specialist agents and the team that
//! combines them. Pure construction, no I/O; invalid configuration
//! only surfaces when a descriptor is used for a remote call.

use super::runner::Agent;
use super::team::Team;
use super::tools::{finance_tools, search_tools};

/// Create the web search specialist agent.
pub fn web_search_agent() -> Agent {
    Agent {
        name: "Web Search Agent".to_string(),
        role: Some("Search the web for the information".to_string()),
        instructions: vec!["Always include sources".to_string()],
        tools: search_tools(),
        show_tool_calls: true,
        markdown: true,
    }
}

/// Create the finance data specialist agent.
pub fn finance_agent() -> Agent {
    Agent {
        name: "Finance AI Agent".to_string(),
        role: None,
        instructions: vec!["Use tables to display the data".to_string()],
        tools: finance_tools(),
        show_tool_calls: true,
        markdown: true,
    }
}

/// Create the combined team consulted for every user query.
pub fn research_team() -> Team {
    Team {
        name: "Nimbus Team".to_string(),
        members: vec![web_search_agent(), finance_agent()],
        instructions: vec![
            "Always include sources".to_string(),
            "Use tables to display the data".to_string(),
        ],
        markdown: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_search_agent_creation() {
        let agent = web_search_agent();
        assert_eq!(agent.name, "Web Search Agent");
        assert_eq!(
            agent.role.as_deref(),
            Some("Search the web for the information")
        );
        assert_eq!(agent.instructions, vec!["Always include sources"]);
        assert_eq!(agent.tools.len(), 1);
        assert_eq!(agent.tools[0].name, "web_search");
        assert!(agent.show_tool_calls);
        assert!(agent.markdown);
    }

    #[test]
    fn test_finance_agent_creation() {
        let agent = finance_agent();
        assert_eq!(agent.name, "Finance AI Agent");
        assert!(agent.role.is_none());
        assert_eq!(agent.instructions, vec!["Use tables to display the data"]);
        let names: Vec<&str> = agent.tools.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"stock_price"));
        assert!(names.contains(&"analyst_recommendations"));
        assert!(names.contains(&"stock_fundamentals"));
        assert!(names.contains(&"company_news"));
    }

    #[test]
    fn test_research_team_composition() {
        let team = research_team();
        assert_eq!(team.members.len(), 2);
        assert_eq!(team.members[0].name, "Web Search Agent");
        assert_eq!(team.members[1].name, "Finance AI Agent");
        assert_eq!(
            team.instructions,
            vec!["Always include sources", "Use tables to display the data"]
        );
        assert!(team.markdown);
    }
}
