//! Deterministic display-name generation, one counter per prefix.

use std::collections::HashMap;

/// Hands out names of the form `prefix.N`. Counters only ever advance, so a
/// name is never reissued even when the instruction it was minted for is
/// later discarded.
#[derive(Debug, Clone, Default)]
pub struct Namer {
    counters: HashMap<String, u64>,
}

impl Namer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_owned()).or_insert(0);
        let name = format!("{prefix}.{counter}");
        *counter += 1;
        name
    }
}

#[cfg(test)]
mod tests {
    use super::Namer;

    #[test]
    fn counters_are_per_prefix() {
        let mut namer = Namer::new();
        assert_eq!(namer.fresh("add"), "add.0");
        assert_eq!(namer.fresh("add"), "add.1");
        assert_eq!(namer.fresh("load"), "load.0");
        assert_eq!(namer.fresh("add"), "add.2");
    }
}
