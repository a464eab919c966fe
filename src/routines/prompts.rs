//! Prompt builders for activity-plan and weekly-routine generation.

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

use super::model::{Activity, DayOfWeek};

/// Child preferences supplied with a generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildPreferences {
    #[serde(default)]
    pub favorite_activities: Option<Vec<String>>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default)]
    pub environment: Option<String>,
}

fn child_context(
    goal: &str,
    child_name: Option<&str>,
    age: Option<u32>,
    preferences: Option<&ChildPreferences>,
    additional_info: Option<&str>,
) -> String {
    let child_info = match child_name {
        Some(name) => format!("Child Name: {name}"),
        None => "Child Name: Not specified".to_string(),
    };
    let age_info = match age {
        Some(age) => format!("Age: {age} years"),
        None => "Age: Not specified".to_string(),
    };

    let preferences_info = match preferences {
        Some(prefs) => {
            let join = |items: &Option<Vec<String>>| {
                items
                    .as_ref()
                    .map(|v| v.join(", "))
                    .unwrap_or_else(|| "Not specified".to_string())
            };
            format!(
                "Preferences:\n- Favorite Activities: {}\n- Interests: {}\n- Preferred Environment: {}",
                join(&prefs.favorite_activities),
                join(&prefs.interests),
                prefs.environment.as_deref().unwrap_or("Not specified"),
            )
        }
        None => "Preferences: None specified".to_string(),
    };

    format!(
        "{child_info}\n{age_info}\nGoal: {goal}\n{preferences_info}\nAdditional Information: {}",
        additional_info.unwrap_or("None provided")
    )
}

/// System prompt for a free-form activity plan.
pub fn activity_plan_prompt(
    goal: &str,
    child_name: Option<&str>,
    age: Option<u32>,
    preferences: Option<&ChildPreferences>,
    additional_info: Option<&str>,
) -> String {
    let context = child_context(goal, child_name, age, preferences, additional_info);
    format!(
        "You are an expert developmental therapist and coach for children with special needs. \
Create a personalized activity plan for a child.\n\n{context}\n\n\
Please provide a structured activity plan with the following format:\n\
1. A brief explanation of why this goal is important (2-3 sentences)\n\
2. 5-7 specific, play-based activities that target this goal\n\
3. For each activity, include:\n\
   - Activity name\n\
   - Simple instructions (2-3 sentences)\n\
   - Materials needed\n\
   - Developmental domains addressed (e.g., +Fine Motor, +Sensory, +Social Skills)\n\
   - Estimated duration\n\
   - Location (indoor/outdoor/both)\n\n\
IMPORTANT: Personalize the activities based on the child's preferences and interests. \
If they like animals, incorporate animal themes. If they prefer indoor activities, focus on those. \
Make the activities feel tailored specifically for this child.\n\n\
Focus on activities that are:\n\
- Simple and achievable for parents\n\
- Fun and engaging for the child\n\
- Use common household items when possible\n\
- Appropriate for the child's age\n\
- Evidence-based for developmental progress\n\
- Aligned with the child's interests and preferences\n\n\
Format your response as a clear, structured plan that empowers parents to be their child's coach."
    )
}

/// System prompt for an AI-generated weekly routine (JSON output).
pub fn weekly_routine_prompt(
    goal: &str,
    child_name: Option<&str>,
    age: Option<u32>,
    preferences: Option<&ChildPreferences>,
    additional_info: Option<&str>,
) -> String {
    let context = child_context(goal, child_name, age, preferences, additional_info);
    format!(
        "You are an expert developmental therapist creating a weekly routine for a child with \
special needs. Create a structured, realistic weekly schedule that parents can follow.\n\n\
{context}\n\n\
Create a weekly routine with 5-7 activities spread across the week. For each activity, provide:\n\
- Activity name (clear and engaging)\n\
- Day of week (monday, tuesday, etc.)\n\
- Recommended time (in HH:MM format, consider realistic family schedules)\n\
- Duration (realistic timeframes like \"15 minutes\" or \"20-25 minutes\")\n\
- Materials needed (common household items when possible)\n\
- Brief description (1-2 sentences on what to do)\n\n\
IMPORTANT Guidelines:\n\
- Distribute activities across different days (don't overload any single day)\n\
- Consider realistic family schedules (avoid very early mornings or late evenings)\n\
- Include variety: some short (10-15 min), some longer (20-30 min) activities\n\
- Personalize based on the child's interests and preferences\n\
- Make activities progressive throughout the week\n\
- Include both active and quiet activities\n\
- Consider the child's energy levels at different times\n\n\
Format your response as a JSON array of activities like this:\n\
[\n\
  {{\n\
    \"name\": \"Activity Name\",\n\
    \"dayOfWeek\": \"monday\",\n\
    \"time\": \"09:30\",\n\
    \"duration\": \"15 minutes\",\n\
    \"materials\": [\"item1\", \"item2\"],\n\
    \"description\": \"Brief description of what to do\"\n\
  }}\n\
]\n\n\
Respond ONLY with the JSON array, no additional text."
    )
}

/// User prompt paired with `activity_plan_prompt`.
pub fn activity_plan_user_prompt(goal: &str, child_name: Option<&str>) -> String {
    format!(
        "Please create a personalized activity plan for {} to work on: \"{goal}\"",
        child_name.unwrap_or("the child")
    )
}

/// User prompt paired with `weekly_routine_prompt`.
pub fn weekly_routine_user_prompt(goal: &str, child_name: Option<&str>) -> String {
    format!(
        "Create a weekly routine for {} to work on: \"{goal}\"",
        child_name.unwrap_or("the child")
    )
}

/// Activity shape the model is asked to emit.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedActivity {
    name: String,
    day_of_week: DayOfWeek,
    time: String,
    duration: String,
    #[serde(default)]
    materials: Vec<String>,
    #[serde(default)]
    description: String,
}

/// Parse the model's JSON array into activities (all initially incomplete).
///
/// The structure is trusted once it parses; a malformed payload is an
/// upstream error.
pub fn parse_weekly_activities(raw: &str) -> Result<Vec<Activity>, LlmError> {
    let generated: Vec<GeneratedActivity> = serde_json::from_str(raw)
        .map_err(|e| LlmError::InvalidResponse(format!("routine JSON did not parse: {e}")))?;
    Ok(generated
        .into_iter()
        .map(|g| Activity {
            name: g.name,
            day_of_week: g.day_of_week,
            time: g.time,
            duration: g.duration,
            materials: g.materials,
            description: g.description,
            completed: false,
            completed_at: None,
        })
        .collect())
}
