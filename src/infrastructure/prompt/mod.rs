//! Prompt builder: mode template + sanitized content -> one prompt string

mod templates;

use crate::domain::ReviewMode;

/// Compose the full prompt for a mode with the sanitized content in the
/// template's content slot. Unknown modes never reach this point; the mode
/// enum is validated at the request boundary.
pub fn build_prompt(mode: ReviewMode, sanitized_code: &str) -> String {
    format!(
        "{base}\n\n\
         Mode: {mode_upper}\n\n\
         Task instruction:\n{task}\n\n\
         Required output style:\n{skeleton}\n\n\
         Respond in markdown. Use the following headings where relevant: \
         TL;DR, Findings, Fix Steps, Code Examples, Notes.\n\n\
         Code to review:\n\
         --------------------------------\n\
         {code}\n\
         --------------------------------\n",
        base = templates::BASE_PERSONA,
        mode_upper = mode.as_str().to_uppercase(),
        task = templates::task(mode),
        skeleton = templates::skeleton(mode),
        code = sanitized_code,
    )
}
