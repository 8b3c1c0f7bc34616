use std::time::Instant;

use crate::error::{Result, SackError};
use crate::id_set::{IdSet, UnitId};
use crate::module::{DefaultStreams, Module, ModuleState};
use crate::sack::Sack;
use crate::solver::DependencySolver;

/// Owns the module universe and the activation result.
///
/// Activation picks, out of all known module streams, the consistent subset
/// that is in effect: explicitly enabled streams plus default streams,
/// closed over their dependencies by an external solver. The result lives
/// here as an id set over the current generation and is replaced wholesale
/// on every successful resolution.
#[derive(Debug, Default)]
pub struct ModuleSack {
    sack: Sack<Module>,
    active: Option<IdSet>,
}

impl ModuleSack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_modules(modules: Vec<Module>) -> Self {
        Self {
            sack: Sack::with_units(modules),
            active: None,
        }
    }

    pub fn sack(&self) -> &Sack<Module> {
        &self.sack
    }

    pub fn sack_mut(&mut self) -> &mut Sack<Module> {
        &mut self.sack
    }

    pub fn module(&self, id: UnitId) -> Option<&Module> {
        self.sack.unit(id)
    }

    /// Replace the module universe with freshly loaded metadata.
    ///
    /// The activation result is discarded along with the old generation —
    /// its ids have no meaning against the new one.
    pub fn rebuild(&mut self, modules: Vec<Module>) {
        self.sack.rebuild(modules);
        self.active = None;
    }

    /// Enable every module matching `name:stream`. Returns whether any
    /// module matched.
    pub fn enable(&mut self, name: &str, stream: &str) -> bool {
        let mut found = false;
        for (_, module) in self.sack.iter() {
            if module.name == name && module.stream == stream {
                module.enable();
                found = true;
            }
        }
        found
    }

    /// Disable every module matching `name:stream`. Returns whether any
    /// module matched.
    pub fn disable(&mut self, name: &str, stream: &str) -> bool {
        let mut found = false;
        for (_, module) in self.sack.iter() {
            if module.name == name && module.stream == stream {
                module.disable();
                found = true;
            }
        }
        found
    }

    /// Pairs of modules sharing a name but not a stream, each unordered
    /// pair once. Callers feed these to their solver as conflicts so at
    /// most one stream per module name gets picked.
    pub fn stream_conflicts(&self) -> Vec<(UnitId, UnitId)> {
        let mut conflicts = Vec::new();
        for (id, module) in self.sack.iter() {
            for (other_id, other) in self.sack.iter().skip(id as usize + 1) {
                if module.name == other.name && module.stream != other.stream {
                    conflicts.push((id, other_id));
                }
            }
        }
        conflicts
    }

    /// Resolve which modules are active.
    ///
    /// Candidates are the enabled modules plus, for modules that are
    /// neither enabled nor disabled, those matching their declared default
    /// stream (which get the `Default` state). The solver turns the
    /// candidates into one consistent solution; ids it returns from the
    /// system repository are filtered out before the result is recorded.
    ///
    /// On solver failure the previous activation result, if any, stays
    /// authoritative.
    pub fn resolve(
        &mut self,
        defaults: &DefaultStreams,
        solver: &dyn DependencySolver,
    ) -> Result<()> {
        let start = Instant::now();

        let mut candidates = Vec::new();
        for (id, module) in self.sack.iter() {
            if module.is_enabled() {
                candidates.push(id);
            } else if !module.is_disabled() && module.is_default(defaults) {
                module.set_state(ModuleState::Default);
                candidates.push(id);
            }
        }
        log::debug!(
            "selected {} activation candidates out of {} modules",
            candidates.len(),
            self.sack.len()
        );

        let mut active = IdSet::new(self.sack.capacity());
        if !candidates.is_empty() {
            let ids = solver
                .solve(&self.sack, &candidates)
                .map_err(SackError::Unresolvable)?;
            for id in ids {
                let module = self.sack.unit(id).ok_or(SackError::IdOutOfRange {
                    id,
                    capacity: self.sack.capacity(),
                })?;
                if module.in_system_repo() {
                    continue;
                }
                active.add_unchecked(id);
            }
        }

        log::info!(
            "module activation resolved in {:.3} seconds, {} of {} modules active",
            start.elapsed().as_secs_f64(),
            active.len(),
            self.sack.len()
        );
        self.active = Some(active);
        Ok(())
    }

    /// Whether a module was picked by the last successful resolution.
    /// Always `false` before the first one; never fails.
    pub fn is_active(&self, id: UnitId) -> bool {
        match &self.active {
            Some(active) => active.contains(id).unwrap_or(false),
            None => false,
        }
    }

    /// The current activation result, if a resolution has run.
    pub fn active(&self) -> Option<&IdSet> {
        self.active.as_ref()
    }

    /// Which active-but-not-enabled modules would need enabling to explain
    /// a package selection.
    ///
    /// For each such module, a query over the package sack is restricted to
    /// `installed` and then to exact matches of the module's artifact
    /// identifiers; a non-empty result reports the module. `nevra` maps a
    /// package unit to its exact identifier.
    pub fn requires_enablement<P, F>(
        &self,
        packages: &Sack<P>,
        installed: &IdSet,
        nevra: F,
    ) -> Result<Vec<UnitId>>
    where
        F: Fn(&P) -> &str,
    {
        let Some(active) = &self.active else {
            return Ok(Vec::new());
        };

        let mut base = packages.new_query();
        base.intersect_set(installed);

        let mut output = Vec::new();
        for (id, module) in self.sack.iter() {
            if !active.contains(id).unwrap_or(false) {
                continue;
            }
            if module.is_enabled() {
                continue;
            }
            let mut test = base.clone();
            let shipped = |package: &P| {
                module
                    .artifacts
                    .iter()
                    .any(|artifact| artifact.as_str() == nevra(package))
            };
            test.filter(&shipped)?;
            if !test.is_empty() {
                output.push(id);
            }
        }
        Ok(output)
    }
}
