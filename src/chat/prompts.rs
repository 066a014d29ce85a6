// src/chat/prompts.rs

//! Fixed strings and prompt builders for the recommendation pipeline.

use crate::catalog::CourseRecord;

/// Default system instruction, prepended when the client sends none.
pub const DEFAULT_SYSTEM_HEADER: &str = "Your name is Eli. You are a helpful assistant for Yale University students to ask questions about courses and academics.";

/// Returned verbatim when the safety gate declines a request.
pub const REFUSAL: &str =
    "I am sorry, but I can only assist with questions related to courses or academics at this time.";

/// Returned verbatim when the provider fails after exhausted retries.
pub const APOLOGY: &str = "Sorry, I encountered an error while processing your request.";

/// Instruction appended for the standalone-query rewrite before embedding.
pub const REFORMULATE_INSTRUCTION: &str = "Rewrite the conversation so far as a single standalone search query describing the courses the user is looking for. Reply with the query text only.";

/// Grounding instruction enumerating the retrieved courses. The final
/// completion may only draw on these, citing titles in bold.
pub fn grounding_prompt(courses: &[CourseRecord]) -> String {
    let mut prompt = String::from("Here are some courses that might be relevant to the user request:\n\n");
    for course in courses {
        prompt.push_str(&format!(
            "{}: {}\n{}\n\n",
            course.course_code, course.title, course.description
        ));
    }
    prompt.push_str(
        "Provide a response to the user. Incorporate specific course information if it is relevant to the user request. Cite course titles in bold, like **Introduction to Computing**, and only draw on the courses listed above.",
    );
    prompt
}

/// Grounding instruction for an empty search result.
pub fn no_results_prompt() -> String {
    "No courses matching the request were found in the catalog. Apologize to the user, say that nothing matching was found, and do not invent or suggest specific courses.".to_string()
}
