//! Renderer options.

/// Options a [`Renderer`](crate::Renderer) is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererOptions {
    /// Prefix marking a prop key as an event listener (`onClick`).
    ///
    /// Prop keys with this prefix always resolve to component props, and
    /// `emit("change")` looks for `{prefix}Change`.
    pub event_prefix: String,
    /// Keep reported diagnostics for later inspection (they are always logged).
    pub record_diagnostics: bool,
    /// Upper bound on flush rounds before the scheduler drops remaining jobs.
    pub max_flush_rounds: usize,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            event_prefix: "on".to_string(),
            record_diagnostics: true,
            max_flush_rounds: 100,
        }
    }
}

impl RendererOptions {
    /// Whether `key` names an event listener.
    pub fn is_event_key(&self, key: &str) -> bool {
        key.starts_with(&self.event_prefix)
    }

    /// Prop key an emitted event is looked up under: `change` → `onChange`.
    pub fn handler_key(&self, event: &str) -> String {
        let mut chars = event.chars();
        match chars.next() {
            Some(first) => format!("{}{}{}", self.event_prefix, first.to_uppercase(), chars.as_str()),
            None => self.event_prefix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_key() {
        let options = RendererOptions::default();
        assert_eq!(options.handler_key("change"), "onChange");
        assert_eq!(options.handler_key("x"), "onX");
        assert_eq!(options.handler_key(""), "on");
    }

    #[test]
    fn test_event_key() {
        let options = RendererOptions::default();
        assert!(options.is_event_key("onClick"));
        assert!(!options.is_event_key("title"));
    }
}
