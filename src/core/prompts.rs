use crate::domain::settings::PromptStyle;

/// The four questions asked for every timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptTask {
    ExtractEvidence,
    PredictWellbeing,
    SummarizePost,
    SummarizeTimeline,
}

impl PromptTask {
    pub fn name(&self) -> &'static str {
        match self {
            PromptTask::ExtractEvidence => "extract_evidence",
            PromptTask::PredictWellbeing => "predict_wellbeing",
            PromptTask::SummarizePost => "summarize_post",
            PromptTask::SummarizeTimeline => "summarize_timeline",
        }
    }
}

const WELLBEING_SCALE: &str = "\
- 1: persistent danger of severely hurting self or others, or a serious suicidal act.
- 2: in danger of hurting self or others, or unable to maintain minimal hygiene or communication.
- 3: delusions or hallucinations, or unable to function in almost all areas.
- 4: impaired reality testing, or major impairment in several areas (work, family, mood).
- 5: serious symptoms (e.g. suicidal thoughts) or serious impairment in social or work life.
- 6: moderate symptoms (e.g. panic attacks) or moderate difficulty functioning.
- 7: mild symptoms, some difficulty, but generally functioning well with meaningful relationships.
- 8: temporary, expected reactions to stressors; slight impairment.
- 9: absent or minimal symptoms, good functioning in all areas.
- 10: no symptoms and superior functioning in a wide range of activities.";

struct Template {
    instructions: &'static str,
    input_label: &'static str,
    format_label: &'static str,
    response_format: &'static str,
}

fn template(style: PromptStyle, task: PromptTask) -> Template {
    match (style, task) {
        (PromptStyle::Default, PromptTask::ExtractEvidence) => Template {
            instructions: "Given the following Reddit post, identify evidence of adaptive and maladaptive self-states.\nExtract text spans as JSON lists.",
            input_label: "Post:",
            format_label: "Response format:",
            response_format: "{\n  \"adaptive_evidence\": [<adaptive text spans>],\n  \"maladaptive_evidence\": [<maladaptive text spans>]\n}",
        },
        (PromptStyle::Default, PromptTask::PredictWellbeing) => Template {
            instructions: "Given the following Reddit post, assign a well-being score from 1 (low) to 10 (high).",
            input_label: "Post:",
            format_label: "Response format:",
            response_format: "{ \"wellbeing_score\": <score> }",
        },
        (PromptStyle::Default, PromptTask::SummarizePost) => Template {
            instructions: "Given the following Reddit post, summarize the interplay between adaptive and maladaptive self-states.",
            input_label: "Post:",
            format_label: "Response format:",
            response_format: "{ \"summary\": \"<post-level summary>\" }",
        },
        (PromptStyle::Default, PromptTask::SummarizeTimeline) => Template {
            instructions: "Given the following series of Reddit posts from one user, generate a timeline-level summary.\nBegin by determining which self-state is dominant (adaptive/maladaptive), describe it first, then focus on the interplay between adaptive and maladaptive self-states over time.",
            input_label: "Timeline:",
            format_label: "Response format:",
            response_format: "{ \"summary\": \"<timeline-level summary>\" }",
        },
        (PromptStyle::Expert, PromptTask::ExtractEvidence) => Template {
            instructions: "You are an expert in psychological self-states and mental health analysis. Extract textual evidence of adaptive and maladaptive self-states from the Reddit post below.\n- Adaptive self-states show resilience, coping, self-awareness, or positive cognitive and behavioral patterns.\n- Maladaptive self-states show distress, negative cognitive distortions, emotional dysregulation, or harmful behaviors.",
            input_label: "**Post:**",
            format_label: "**Response format (strict JSON):**",
            response_format: "{\n  \"adaptive_evidence\": [<text spans that show adaptive self-states>],\n  \"maladaptive_evidence\": [<text spans that show maladaptive self-states>]\n}",
        },
        (PromptStyle::Expert, PromptTask::PredictWellbeing) => Template {
            instructions: "You are a clinical expert in mental health assessment. Assign a well-being score (1-10) to the Reddit post below based on its emotional, cognitive, and behavioral indicators.",
            input_label: "**Post:**",
            format_label: "**Response format (strict JSON):**",
            response_format: "{ \"wellbeing_score\": <integer between 1 and 10> }",
        },
        (PromptStyle::Expert, PromptTask::SummarizePost) => Template {
            instructions: "You are a psychological expert analyzing self-states in text. Determine which self-state is dominant (adaptive/maladaptive) and describe it first, then summarize how adaptive and maladaptive self-states interact within this post.\n- Identify key emotional, cognitive, and behavioral patterns.\n- Highlight contrasts between adaptive and maladaptive self-states.\n- Provide an objective, clinical-style summary.",
            input_label: "**Post:**",
            format_label: "**Response format (strict JSON):**",
            response_format: "{ \"summary\": \"<concise analysis of self-states in the post>\" }",
        },
        (PromptStyle::Expert, PromptTask::SummarizeTimeline) => Template {
            instructions: "You are a clinical psychologist analyzing mental health trends over time. Given the following series of Reddit posts from a single user, summarize their self-state trajectory.\n- Identify patterns of emotional and cognitive change.\n- Note shifts between adaptive and maladaptive self-states.\n- Highlight any signs of improvement, deterioration, or instability.",
            input_label: "**Timeline:**",
            format_label: "**Response format (strict JSON):**",
            response_format: "{ \"summary\": \"<timeline-level psychological summary>\" }",
        },
    }
}

/// Builds the prompt for `task`; `text` is a post, or the joined posts of a timeline.
pub fn render(style: PromptStyle, task: PromptTask, text: &str) -> String {
    let t = template(style, task);
    let scale = if task == PromptTask::PredictWellbeing {
        format!("\n{}", WELLBEING_SCALE)
    } else {
        String::new()
    };

    format!(
        "{}{}\n\n{}\n\"{}\"\n\n{}\n{}\n",
        t.instructions, scale, t.input_label, text, t.format_label, t.response_format
    )
}
