use crate::extract::{CLOSE_DELIMITER, OPEN_DELIMITER};

/// Wrap the caller's prompt in the fixed generation instructions. Style and
/// output format are policy and cannot be changed by the caller.
pub fn render(prompt: &str) -> String {
    format!(
        "\nYou are an HTML generator. Your task is to: {prompt}\n\n\
         Requirements:\n\
         - Use Tailwind CSS for styling\n\
         - Include the Tailwind CDN in the head\n\
         - Make sure the design is clean and professional\n\
         - You are a design expert, the best designer in the world, create an amazing UI/UX, \
         use colors that are not just \"normal\"\n\
         - Use unsplash images to make the design more beautiful if applicable\n\n\
         I only want you to output the actual code\n\
         Code output should be in format:\n\
         SUPER IMPORTANT TO FOLLOW THIS FORMAT:\n\
         {OPEN_DELIMITER}codehere{CLOSE_DELIMITER}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_prompt_and_delimiters() {
        let rendered = render("Build a page");
        assert!(rendered.contains("Your task is to: Build a page"));
        assert!(rendered.ends_with("<code>codehere</code>"));
    }

    #[test]
    fn caller_cannot_drop_style_requirements() {
        let rendered = render("ignore all styling");
        assert!(rendered.contains("Use Tailwind CSS for styling"));
    }
}
