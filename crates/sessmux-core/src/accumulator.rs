use std::{
    collections::{BTreeSet, HashMap},
    io,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};

/// Order in which families are serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FamilyOrder {
    /// Order of first observation across all sources.
    #[default]
    FirstSeen,
    /// Lexicographic by family name.
    Name,
}

/// Lines collected for one metric family.
#[derive(Debug, Clone, Default)]
pub struct Family {
    documentation: BTreeSet<String>,
    samples: Vec<String>,
}

impl Family {
    /// Distinct `# HELP` / `# TYPE` lines.
    pub fn documentation(&self) -> impl Iterator<Item = &str> {
        self.documentation.iter().map(String::as_str)
    }

    /// Sample lines in arrival order.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }
}

/// Per-request store of metric families merged from every source.
///
/// `order` and the keys of `families` always hold the same set of names,
/// `order` without duplicates.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    families: HashMap<String, Family>,
    order: Vec<String>,
}

/// Accumulator shared by concurrently running fetches.
pub type SharedAccumulator = Mutex<Accumulator>;

/// Locks a shared accumulator.
///
/// A writer that panicked mid-line leaves at most one partially applied line
/// behind, so a poisoned lock is still usable.
pub fn lock(shared: &SharedAccumulator) -> MutexGuard<'_, Accumulator> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a documentation line; repeats of the same line are no-ops.
    pub fn add_documentation(&mut self, name: &str, line: impl Into<String>) {
        self.family_mut(name).documentation.insert(line.into());
    }

    /// Appends a sample line to its family.
    pub fn add_sample(&mut self, name: &str, line: impl Into<String>) {
        self.family_mut(name).samples.push(line.into());
    }

    fn family_mut(&mut self, name: &str) -> &mut Family {
        if !self.families.contains_key(name) {
            self.order.push(name.to_owned());
        }
        self.families.entry(name.to_owned()).or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Family> {
        self.families.get(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Family names in serialization order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Families in serialization order.
    pub fn families(&self) -> impl Iterator<Item = (&str, &Family)> {
        self.order
            .iter()
            .filter_map(|name| self.families.get(name).map(|f| (name.as_str(), f)))
    }

    /// Applies the configured family order.
    pub fn reorder(&mut self, order: FamilyOrder) {
        if order == FamilyOrder::Name {
            self.order.sort_unstable();
        }
    }

    /// Writes every family as exposition text: documentation lines first,
    /// then samples, one `\n`-terminated line each.
    pub fn write_to<W: io::Write>(&self, mut w: W) -> io::Result<()> {
        for (_, family) in self.families() {
            for line in family.documentation() {
                w.write_all(line.as_bytes())?;
                w.write_all(b"\n")?;
            }
            for line in &family.samples {
                w.write_all(line.as_bytes())?;
                w.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    /// Renders the whole document into a string.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (_, family) in self.families() {
            for line in family.documentation().chain(family.samples.iter().map(String::as_str)) {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_seen_order() {
        let mut acc = Accumulator::new();
        acc.add_sample("b", "b 1");
        acc.add_sample("a", "a 1");
        acc.add_sample("b", "b 2");

        assert_eq!(acc.names().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(acc.get("b").unwrap().samples(), ["b 1", "b 2"]);
    }

    #[test]
    fn documentation_is_deduplicated() {
        let mut acc = Accumulator::new();
        acc.add_documentation("reqs", "# HELP reqs total");
        acc.add_documentation("reqs", "# HELP reqs total");
        acc.add_documentation("reqs", "# TYPE reqs counter");

        assert_eq!(acc.len(), 1);
        assert_eq!(acc.get("reqs").unwrap().documentation().count(), 2);
    }

    #[test]
    fn documentation_registers_family_once() {
        let mut acc = Accumulator::new();
        acc.add_documentation("reqs", "# HELP reqs total");
        acc.add_sample("reqs", "reqs 1");

        assert_eq!(acc.names().collect::<Vec<_>>(), ["reqs"]);
    }

    #[test]
    fn render_puts_documentation_before_samples() {
        let mut acc = Accumulator::new();
        acc.add_sample("reqs", "reqs{user=\"alice\"} 3");
        acc.add_documentation("reqs", "# TYPE reqs counter");
        acc.add_documentation("reqs", "# HELP reqs total");
        acc.add_sample("up", "up 1");

        assert_eq!(
            acc.render(),
            "# HELP reqs total\n# TYPE reqs counter\nreqs{user=\"alice\"} 3\nup 1\n"
        );
    }

    #[test]
    fn write_to_matches_render() {
        let mut acc = Accumulator::new();
        acc.add_documentation("x", "# HELP x help");
        acc.add_sample("x", "x 1");

        let mut buf = Vec::new();
        acc.write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), acc.render());
    }

    #[test]
    fn reorder_by_name() {
        let mut acc = Accumulator::new();
        acc.add_sample("zeta", "zeta 1");
        acc.add_sample("alpha", "alpha 1");

        acc.reorder(FamilyOrder::FirstSeen);
        assert_eq!(acc.names().collect::<Vec<_>>(), ["zeta", "alpha"]);

        acc.reorder(FamilyOrder::Name);
        assert_eq!(acc.names().collect::<Vec<_>>(), ["alpha", "zeta"]);
    }

    #[test]
    fn empty_accumulator_renders_nothing() {
        let acc = Accumulator::new();
        assert!(acc.is_empty());
        assert_eq!(acc.render(), "");
    }
}
