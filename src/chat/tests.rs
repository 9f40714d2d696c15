use super::*;
use serde_json::json;
use std::io::Cursor;

/// Fake chain capturing the questions it is asked
struct FakeAnswerer {
    questions: Vec<String>,
    response: ChainResponse,
}

impl FakeAnswerer {
    fn new(response: ChainResponse) -> Self {
        Self {
            questions: Vec::new(),
            response,
        }
    }

    fn canned(answer: &str, sources: Vec<Value>) -> Self {
        Self::new(ChainResponse {
            answer: answer.to_string(),
            sources,
        })
    }
}

#[async_trait]
impl QuestionAnswerer for FakeAnswerer {
    async fn ask(&mut self, question: &str) -> ChainResponse {
        self.questions.push(question.to_string());
        self.response.clone()
    }
}

async fn run_with_input(chain: &mut FakeAnswerer, input: &str) -> String {
    let mut output = Vec::new();
    run_repl(chain, Cursor::new(input.as_bytes()), &mut output)
        .await
        .expect("repl should succeed");
    String::from_utf8(output).expect("output is UTF-8")
}

#[tokio::test]
async fn quit_terminates_without_asking() {
    let mut chain = FakeAnswerer::canned("unused", Vec::new());
    let output = run_with_input(&mut chain, "quit\n").await;

    assert!(chain.questions.is_empty());
    assert!(output.contains("Enter your question (or 'quit' to exit):"));
}

#[tokio::test]
async fn quit_is_case_insensitive() {
    let mut chain = FakeAnswerer::canned("unused", Vec::new());
    run_with_input(&mut chain, "QUIT\n").await;

    assert!(chain.questions.is_empty());
}

#[tokio::test]
async fn end_of_input_terminates_the_loop() {
    let mut chain = FakeAnswerer::canned("unused", Vec::new());
    let output = run_with_input(&mut chain, "").await;

    assert!(chain.questions.is_empty());
    assert!(output.contains("Enter your question"));
}

#[tokio::test]
async fn question_is_answered_with_sources() {
    let mut chain = FakeAnswerer::canned(
        "The school was founded in 1552.",
        vec![json!({ "source": "SGS_History/founding.txt" })],
    );
    let output = run_with_input(&mut chain, "When was the school founded?\nquit\n").await;

    assert_eq!(chain.questions, vec!["When was the school founded?"]);
    assert!(output.contains("Answer: The school was founded in 1552."));
    assert!(output.contains("Sources:"));
    assert!(output.contains(r#"- {"source":"SGS_History/founding.txt"}"#));
}

#[tokio::test]
async fn empty_question_still_gets_a_well_formed_response() {
    let mut chain = FakeAnswerer::canned(FALLBACK_ANSWER, Vec::new());
    let output = run_with_input(&mut chain, "\nquit\n").await;

    assert_eq!(chain.questions, vec![String::new()]);
    assert!(output.contains(&format!("Answer: {FALLBACK_ANSWER}")));
    assert!(output.contains("Sources:"));
}

#[tokio::test]
async fn multiple_questions_flow_through_one_session() {
    let mut chain = FakeAnswerer::canned("answer", Vec::new());
    run_with_input(&mut chain, "first question\nsecond question\nquit\n").await;

    assert_eq!(chain.questions, vec!["first question", "second question"]);
}
