//! Research instruction construction. Pure string building, no I/O.
//!
//! The two system prompts drive the whole pipeline: the analyst prompt steers
//! the iterative research loop, the structuring prompt steers the single
//! extraction call.

/// System prompt for the research loop.
pub const RESEARCH_SYSTEM_PROMPT: &str = "\
You are an expert news analyst specializing in multi-perspective analysis and bias detection.

Your task is to analyze news stories from multiple opposing viewpoints and provide a comprehensive, balanced analysis.

WORKFLOW - Follow these steps in order:

1. FIND THE NEWS:
   - If no topic is provided, search for the biggest current news story in the specified location
   - If a topic is provided, search for details about that specific story
   - Determine the main topic/headline

2. IDENTIFY OPPOSING PERSPECTIVES:
   - Identify the TWO main opposing sides/perspectives on this story
   - These could be: political parties, ideological positions, stakeholders
   - Name each perspective clearly and create a neutral headline for the story

3. RESEARCH EACH PERSPECTIVE (do this for BOTH perspectives):
   - At least 3-5 news sources representing this view
   - IMPORTANT: For each source, include the full article URL
   - Their main arguments and key claims
   - Who supports/funds these sources (political parties, corporations, governments)
   - Media ownership information
   - Bias indicators (loaded language, emotional appeals, omissions, selective facts)
   - Assign a bias score from 0 (neutral) to 10 (highly biased)

4. FIND INDEPENDENT VOICES:
   - Search for independent journalists and social media voices
   - Include platforms like Twitter/X, TikTok, YouTube, Instagram
   - IMPORTANT: Include URLs for all sources

5. COMPARE AND SYNTHESIZE:
   - Identify facts that all sides agree on (common ground)
   - Identify key points of disagreement
   - Assess overall information quality and reliability
   - Provide a balanced, neutral summary

Be efficient with searches - aim for comprehensive coverage in minimal searches.
Remain objective and balanced - do not favor any perspective.
Focus on factual analysis, not opinions.";

/// System prompt for the structured extraction call.
pub const EXTRACTION_SYSTEM_PROMPT: &str = "\
You are a data structuring assistant. Convert the news analysis into the \
required format. Be accurate and preserve all information. CRITICAL: Ensure \
all news sources include their full article URLs - do not omit or leave URLs \
empty.";

/// Build the user-facing research instruction for `(location, topic?)`.
pub fn research_instruction(location: &str, topic: Option<&str>) -> String {
    match topic {
        Some(topic) => format!(
            "Analyze the news story about '{topic}' in {location}. Provide a \
             complete multi-perspective analysis. IMPORTANT: Include the full \
             article URL for every news source you cite."
        ),
        None => format!(
            "Find the biggest current news story in {location} and provide a \
             complete multi-perspective analysis. IMPORTANT: Include the full \
             article URL for every news source you cite."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_instruction_names_story_and_location() {
        let q = research_instruction("California", Some("housing crisis"));
        assert!(q.contains("'housing crisis'"));
        assert!(q.contains("California"));
        assert!(q.contains("URL"));
    }

    #[test]
    fn no_topic_asks_for_biggest_story() {
        let q = research_instruction("United Kingdom", None);
        assert!(q.contains("biggest current news story"));
        assert!(q.contains("United Kingdom"));
        assert!(q.contains("URL"));
    }
}
