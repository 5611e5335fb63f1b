use crate::{
    imports::Imports,
    instance::Instance,
    module::Module,
    stack::DEFAULT_MAX_CALL_DEPTH,
    trap::InstantiationError,
};

/// Default cap on linear memory, in pages (16 MiB). Memory is allocated
/// eagerly at instantiation.
pub const DEFAULT_MAX_MEMORY_PAGES: u32 = 256;

/// Execution limits applied to every instance created by a [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of nested guest calls before `Trap::StackOverflow`.
    pub max_call_depth: usize,
    /// Upper bound on linear memory size, in pages.
    pub max_memory_pages: u32,
    /// Upper bound on table size, in slots.
    pub max_table_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_memory_pages: DEFAULT_MAX_MEMORY_PAGES,
            max_table_size: 10_000_000,
        }
    }
}

impl Config {
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn max_memory_pages(mut self, pages: u32) -> Self {
        self.max_memory_pages = pages;
        self
    }

    pub fn max_table_size(mut self, slots: u32) -> Self {
        self.max_table_size = slots;
        self
    }
}

/// Top-level runtime context. Holds the configuration shared by all
/// instances it creates; instances themselves share no mutable state.
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    config: Config,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        tracing::debug!(?config, "runtime configured");
        Runtime { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Instantiate a module: resolve imports, allocate memory, table and
    /// globals, apply segments and run the start function.
    pub fn instantiate<'m>(
        &self,
        module: &'m Module,
        imports: &Imports,
    ) -> Result<Instance<'m>, InstantiationError> {
        Instance::new(module, imports, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let c = Config::default().max_call_depth(16).max_memory_pages(2);
        assert_eq!(c.max_call_depth, 16);
        assert_eq!(c.max_memory_pages, 2);
        assert_eq!(c.max_table_size, Config::default().max_table_size);
        assert_eq!(Runtime::with_config(c).config(), &c);
    }

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.max_call_depth, 1024);
        assert_eq!(c.max_memory_pages, DEFAULT_MAX_MEMORY_PAGES);
        assert_eq!(c.max_table_size, 10_000_000);
    }
}
