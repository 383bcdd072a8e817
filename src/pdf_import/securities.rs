//! Per-document security lookup.

use super::model::Security;

#[derive(Debug, Clone)]
struct CreatedSecurity {
    security: Security,
    reported: bool,
}

/// Resolves securities found on a statement against the securities the
/// caller already knows and the ones created earlier in the same document.
#[derive(Debug, Clone, Default)]
pub struct SecurityCache {
    known: Vec<Security>,
    created: Vec<CreatedSecurity>,
}

impl SecurityCache {
    pub fn new(known: Vec<Security>) -> Self {
        Self {
            known,
            created: Vec::new(),
        }
    }

    pub fn lookup(&self, candidate: &Security) -> Option<&Security> {
        self.known
            .iter()
            .find(|s| s.same_as(candidate))
            .or_else(|| {
                self.created
                    .iter()
                    .map(|c| &c.security)
                    .find(|s| s.same_as(candidate))
            })
    }

    /// Return the matching known or created security, or register `candidate`
    /// as a new one.
    ///
    /// Fields missing on an already created security are filled in from the
    /// candidate, so a later block may add the WKN or currency.
    pub fn get_or_create(&mut self, candidate: Security) -> Security {
        if let Some(known) = self.known.iter().find(|s| s.same_as(&candidate)) {
            return known.clone();
        }

        if let Some(created) = self
            .created
            .iter_mut()
            .find(|c| c.security.same_as(&candidate))
        {
            let target = &mut created.security;
            fill(&mut target.name, candidate.name);
            fill(&mut target.isin, candidate.isin);
            fill(&mut target.wkn, candidate.wkn);
            fill(&mut target.ticker, candidate.ticker);
            fill(&mut target.currency, candidate.currency);
            return target.clone();
        }

        log::debug!("PDF Import: New security {}", candidate.label());
        self.created.push(CreatedSecurity {
            security: candidate.clone(),
            reported: false,
        });
        candidate
    }

    /// Hand out a created security the first time an item references it.
    pub fn take_unreported(&mut self, security: &Security) -> Option<Security> {
        let created = self
            .created
            .iter_mut()
            .find(|c| !c.reported && c.security.same_as(security))?;
        created.reported = true;
        Some(created.security.clone())
    }

    pub fn created(&self) -> impl Iterator<Item = &Security> {
        self.created.iter().map(|c| &c.security)
    }
}

fn fill(target: &mut Option<String>, value: Option<String>) {
    if target.is_none() {
        *target = value;
    }
}
