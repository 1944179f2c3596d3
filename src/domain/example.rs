// ============================================================
// Layer 3 — PairExample Domain Type
// ============================================================
// One next-utterance ranking example:
//   - a dialogue context (everything said so far)
//   - one candidate response
//   - per-token feature flags for both sides
//   - a binary label: is this the response that actually followed?
//
// Token sequences hold vocabulary indices, not strings.
// Index 0 is the padding index, so a real token is never 0.
//
// Example (indices made up):
//   context:  [12, 7, 931, 4]      "how do i mount usb"
//   response: [88, 12]             "use pmount"
//   label:    1.0

use serde::{Deserialize, Serialize};

/// A labelled (context, response) pair with token-level features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairExample {
    /// Token indices of the dialogue context (s0)
    pub context: Vec<u32>,

    /// Token indices of the candidate response (s1)
    pub response: Vec<u32>,

    /// One feature vector per context token (f0)
    pub context_features: Vec<Vec<f32>>,

    /// One feature vector per response token (f1)
    pub response_features: Vec<Vec<f32>>,

    /// 1.0 if the response is the true continuation, 0.0 otherwise
    pub label: f32,
}

impl PairExample {
    pub fn new(
        context:           Vec<u32>,
        response:          Vec<u32>,
        context_features:  Vec<Vec<f32>>,
        response_features: Vec<Vec<f32>>,
        label:             f32,
    ) -> Self {
        Self { context, response, context_features, response_features, label }
    }

    /// True when the label marks the response as the real continuation
    pub fn is_relevant(&self) -> bool {
        self.label > 0.5
    }
}
