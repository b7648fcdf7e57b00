//! Static per-mode template data consumed by the prompt builder

use crate::domain::ReviewMode;

pub const BASE_PERSONA: &str = "You are CodeSage.ai, an expert code reviewer. \
Your audience is a junior developer. Use simple English. Use short sentences. \
Be clear and actionable.";

/// One-line task instruction per mode
pub fn task(mode: ReviewMode) -> &'static str {
    match mode {
        ReviewMode::Bugs => {
            "Explain each bug: what, why, and how to fix. Include a tiny code example."
        }
        ReviewMode::Improvements => {
            "Suggest improvements. One-line reason each. Include small before/after when helpful."
        }
        ReviewMode::Refactor => {
            "Give a small refactor plan. List steps. Name functions/modules. Include a short example."
        }
        ReviewMode::Explain => {
            "Explain what the code does. Summarize modules and key functions in simple terms."
        }
        ReviewMode::Performance => {
            "Identify performance bottlenecks. Mention complexity and concrete optimizations."
        }
        ReviewMode::Security => {
            "Identify security risks and misuse patterns. Provide safe fixes and best practices."
        }
        ReviewMode::Overview => "Provide a high-level overview and key strengths/risks.",
        ReviewMode::Architecture => {
            "Assess architecture, module boundaries, and coupling. Suggest improvements."
        }
    }
}

/// Output skeleton per mode, keeping the answers structurally distinct
pub fn skeleton(mode: ReviewMode) -> &'static str {
    match mode {
        ReviewMode::Bugs => {
            "Answer with: TL;DR (3-5 bullets), Findings (one bug per bullet, file/line if possible), \
             Fix Steps (ordered, concrete), and a tiny code example showing the fix. Keep examples minimal."
        }
        ReviewMode::Improvements => {
            "Answer with: TL;DR (3-5 bullets), Improvements (each with one-line rationale), \
             Before/After snippets when helpful, and optional trade-offs. Avoid rewriting whole files."
        }
        ReviewMode::Refactor => {
            "Answer with: Summary, High-level refactor plan (ordered steps), list of functions/modules to change, \
             estimated effort, and a short example showing a refactored function. Emphasize small, safe refactors."
        }
        ReviewMode::Explain => {
            "Answer with: Short summary, what each major function does, and a brief line-by-line \
             explanation for the top 10 lines or the most complex function. Keep it educational."
        }
        ReviewMode::Performance => {
            "Answer with: TL;DR, list of performance hotspots (with Big-O or complexity notes), \
             concrete optimizations, and one small code change example to improve speed or memory. \
             Include estimated impact."
        }
        ReviewMode::Security => {
            "Answer with: TL;DR, list of security issues (severity: low/medium/high), exploit example \
             (short), and secure fix steps. Mention input validation and secrets handling."
        }
        ReviewMode::Overview => {
            "Answer with: Short project overview, main responsibilities of files, strengths, weaknesses, \
             and recommended next steps."
        }
        ReviewMode::Architecture => {
            "Answer with: High-level architecture review, coupling/cohesion notes, suggested module \
             boundaries, and migration steps for large changes."
        }
    }
}
