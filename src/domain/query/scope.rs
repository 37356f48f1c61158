#[cfg(test)]
use mockall::automock;

/// Ambient read scope of the current request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeContext {
    pub preview: bool,
    pub channel: Option<String>,
    pub language: Option<String>,
}

impl ScopeContext {
    pub fn live() -> Self {
        Self::default()
    }

    pub fn preview() -> Self {
        Self {
            preview: true,
            ..Default::default()
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Supplies the scope each repository call runs in
#[cfg_attr(test, automock)]
pub trait ScopeProvider: Send + Sync {
    fn current(&self) -> ScopeContext;
}

/// Provider returning the same scope for every call
#[derive(Debug, Clone, Default)]
pub struct StaticScopeProvider {
    scope: ScopeContext,
}

impl StaticScopeProvider {
    pub fn new(scope: ScopeContext) -> Self {
        Self { scope }
    }
}

impl ScopeProvider for StaticScopeProvider {
    fn current(&self) -> ScopeContext {
        self.scope.clone()
    }
}
