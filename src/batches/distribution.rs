//! Display rule for how a batch was split across agents.
//!
//! The backend assigns items round-robin over exactly five agents, so the
//! first `n % 5` agents in assignment order hold one item more than the rest.

pub const AGENTS_PER_BATCH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Share {
    pub items: usize,
    pub extra: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    total: usize,
    shares: Vec<Share>,
}

impl Distribution {
    pub fn from_count(total: usize) -> Self {
        let base = total / AGENTS_PER_BATCH;
        let remainder = total % AGENTS_PER_BATCH;
        let shares = (0..AGENTS_PER_BATCH)
            .map(|slot| Share {
                items: base + usize::from(slot < remainder),
                extra: slot < remainder,
            })
            .collect();
        Self { total, shares }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Per-agent shares in assignment order.
    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    pub fn extra_count(&self) -> usize {
        self.total % AGENTS_PER_BATCH
    }

    pub fn note(&self) -> String {
        let mut note = format!(
            "This batch was distributed equally among {AGENTS_PER_BATCH} agents."
        );
        let extra = self.extra_count();
        if extra > 0 {
            note.push_str(&format!(
                " The first {extra} agent(s) received one extra item."
            ));
        }
        note
    }
}
