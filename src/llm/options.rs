use serde::Serialize;

/// Decoding options passed through to the generation backend.
///
/// A pure parameter lookup: the chosen model family decides the values, and
/// nothing downstream branches on them.
#[derive(Debug, Clone, Serialize)]
pub struct DecodingOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub num_predict: u32,
    pub repeat_penalty: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            num_predict: 256,
            repeat_penalty: 1.1,
            stop: Vec::new(),
        }
    }
}

/// Static per-family options table, keyed by model name prefix.
pub fn for_model(model: &str) -> DecodingOptions {
    let family = model.split([':', '-']).next().unwrap_or(model);
    match family {
        // Small phi models ramble; cap output and stop at a blank line.
        "phi" | "phi3" => DecodingOptions {
            num_predict: 200,
            stop: vec!["\n\n".to_string()],
            ..DecodingOptions::default()
        },
        "llama" | "llama2" | "llama3" => DecodingOptions::default(),
        "mistral" => DecodingOptions {
            temperature: 0.6,
            ..DecodingOptions::default()
        },
        _ => DecodingOptions::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phi_family_capped() {
        let options = for_model("phi3:mini");
        assert_eq!(options.num_predict, 200);
        assert_eq!(options.stop, vec!["\n\n".to_string()]);
    }

    #[test]
    fn test_unknown_family_uses_defaults() {
        let options = for_model("qwen2.5:7b");
        assert_eq!(options.num_predict, 256);
        assert!(options.stop.is_empty());
    }

    #[test]
    fn test_mistral_runs_cooler() {
        assert!(for_model("mistral").temperature < for_model("llama3.2").temperature);
    }
}
