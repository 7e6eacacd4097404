//! Provider integration pass.
//!
//! Wires generated module-provider artifacts into the native targets of the
//! loaded projects: one provider per participating target, registered
//! exactly once in that target's compiled sources, mirrored by a group tree
//! under [`GENERATED_GROUP_NAME`], with stale groups removed for targets
//! that dropped out. Runs once per build-configuration pass, after the host
//! pipeline's own default target integration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::definition::TargetDefinition;
use crate::core::project::Project;
use crate::core::store::ProjectStore;
use crate::core::target::NativeTarget;
use crate::core::tree::{GroupTree, NodeId};
use crate::ops::errors::IntegrateError;
use crate::ops::scrub::scrub_dangling_refs;
use crate::util::paths::relative_to;

/// Name of the root group that mirrors generated provider artifacts.
pub const GENERATED_GROUP_NAME: &str = "Generated Module Providers";

/// Whether a target participates in provider integration: autolinking has
/// been configured for it and the configuration currently requires a
/// generated provider. Pure function of collaborator state, re-evaluated on
/// every run.
pub fn needs_provider(target: &NativeTarget) -> bool {
    target
        .definition()
        .is_some_and(|definition| definition.needs_provider_generation())
}

/// Orchestrates one provider-integration pass over a set of projects.
pub struct Integrator<'a> {
    store: &'a mut dyn ProjectStore,
    /// Project paths the host pipeline saves itself after this pass. The
    /// save step skips them to avoid writing the same project twice.
    scheduled_for_save: HashSet<PathBuf>,
}

impl<'a> Integrator<'a> {
    /// An integrator persisting through `store`, with nothing pre-scheduled.
    pub fn new(store: &'a mut dyn ProjectStore) -> Self {
        Integrator {
            store,
            scheduled_for_save: HashSet::new(),
        }
    }

    /// Declare project paths the host pipeline will save on its own.
    pub fn with_scheduled_for_save(
        mut self,
        paths: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        self.scheduled_for_save.extend(paths);
        self
    }

    /// Run the pass: integrate providers into every project, scrub dangling
    /// build-phase references, then save each dirty project exactly once.
    ///
    /// The first failure aborts the pass. Mutations already applied stay
    /// in memory with the dirty flag set but are never persisted, so a
    /// failed pass cannot corrupt the on-disk projects.
    pub fn integrate(&mut self, projects: &mut [Project]) -> Result<(), IntegrateError> {
        for project in projects.iter_mut() {
            tracing::info!("Integrating module providers into `{}`", project.name());
            integrate_project(project)?;
            scrub_dangling_refs(project);
        }
        self.save_dirty(projects)
    }

    fn save_dirty(&mut self, projects: &mut [Project]) -> Result<(), IntegrateError> {
        for project in projects.iter_mut() {
            if !project.is_dirty() || self.scheduled_for_save.contains(project.path()) {
                continue;
            }
            self.store
                .save(project)
                .map_err(|source| IntegrateError::Persistence {
                    project: project.name().to_string(),
                    source,
                })?;
            project.mark_clean();
        }
        Ok(())
    }
}

/// The per-project integration algorithm.
fn integrate_project(project: &mut Project) -> Result<(), IntegrateError> {
    // Classify, then fix the processing order by target name so output and
    // dirty-set are reproducible regardless of load order.
    let mut wanted: Vec<usize> = (0..project.targets().len())
        .filter(|&i| needs_provider(&project.targets()[i]))
        .collect();
    wanted.sort_by(|&a, &b| project.targets()[a].name().cmp(project.targets()[b].name()));

    // Auto-create the root group only if some target actually needs it.
    let main_group = project.tree().root();
    let Some(root) =
        project.find_or_create_group(main_group, GENERATED_GROUP_NAME, !wanted.is_empty())
    else {
        // Nothing generated before, nothing needed now.
        return Ok(());
    };

    // Remove subgroups of targets that were renamed, removed, or whose
    // module set shrank to zero.
    let wanted_names: HashSet<String> = wanted
        .iter()
        .map(|&i| project.targets()[i].name().to_string())
        .collect();
    let stale: Vec<_> = project
        .tree()
        .child_groups(root)
        .into_iter()
        .filter_map(|gid| {
            project
                .tree()
                .group(gid)
                .map(|group| (gid, group.name().to_string()))
        })
        .filter(|(_, name)| !wanted_names.contains(name))
        .collect();
    for (gid, name) in stale {
        tracing::info!("Removing the stale `{}` provider group", name);
        project.remove_group_recursive(gid);
    }

    for &idx in &wanted {
        let (target_name, definition) = {
            let target = &project.targets()[idx];
            let definition = target.definition().cloned().ok_or_else(|| {
                IntegrateError::MissingDefinition {
                    target: target.name().to_string(),
                }
            })?;
            (target.name().to_string(), definition)
        };
        integrate_target(project, root, idx, &target_name, definition)?;
    }

    // All targets dropped autolinking: the root group has no reason to stay.
    if wanted.is_empty() && project.remove_group_recursive(root) > 0 {
        tracing::info!("Removing the `{}` group", GENERATED_GROUP_NAME);
    }

    Ok(())
}

fn integrate_target(
    project: &mut Project,
    root: NodeId,
    target_index: usize,
    target_name: &str,
    definition: Arc<dyn TargetDefinition>,
) -> Result<(), IntegrateError> {
    let output_path = definition
        .support_files_dir()
        .join(definition.provider_file_name());

    tracing::info!("Generating the module provider for the `{}` target", target_name);
    definition
        .generate(target_name, &output_path)
        .map_err(|source| IntegrateError::Generation {
            target: target_name.to_string(),
            source,
        })?;

    let subgroup = project.ensure_group(root, target_name);

    // Groups hold relative paths; express the artifact relative to the
    // subgroup's resolved location so the lookup below and the build-phase
    // check compare the same string.
    let rel_path = relative_to(&output_path, &project.tree().location(subgroup));

    // Idempotence anchor: an unchanged path on a re-run finds the existing
    // entry and creates nothing.
    let file = match project.tree().find_file_by_path(subgroup, &rel_path) {
        Some(existing) => existing,
        None => project.new_file_in_group(subgroup, &output_path),
    };

    // At-most-once registration, checked independently of whether the file
    // entry pre-existed.
    if !build_phase_references(project.tree(), &project.targets()[target_index], &rel_path) {
        project.register_build_file(target_index, file);
        tracing::debug!(
            "Registered `{}` in the sources of `{}`",
            rel_path.display(),
            target_name
        );
    }

    Ok(())
}

fn build_phase_references(tree: &GroupTree, target: &NativeTarget, rel_path: &Path) -> bool {
    target.source_build_phase().iter().any(|entry| {
        entry
            .file_ref()
            .and_then(|id| tree.file(id))
            .is_some_and(|file| file.path() == rel_path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingStore, MemoryStore, StubDefinition};

    fn stub(dir: &str) -> Arc<StubDefinition> {
        Arc::new(StubDefinition::new(dir))
    }

    fn project_with(targets: Vec<NativeTarget>) -> Project {
        let mut project = Project::new("App", "/proj/App.shipproj");
        for target in targets {
            project.add_target(target);
        }
        project
    }

    fn provider_entries(project: &Project, target: usize) -> usize {
        project.targets()[target].source_build_phase().len()
    }

    #[test]
    fn first_run_wires_one_provider_and_leaves_others_alone() {
        let def = stub("/proj/Support/A");
        let mut project = project_with(vec![
            NativeTarget::new("A").with_definition(def.clone()),
            NativeTarget::new("B"),
        ]);
        let mut store = MemoryStore::default();

        Integrator::new(&mut store)
            .integrate(std::slice::from_mut(&mut project))
            .unwrap();

        let tree = project.tree();
        let root = tree.find_subpath(tree.root(), GENERATED_GROUP_NAME).unwrap();
        let subgroup = tree.find_subpath(root, "A").unwrap();
        assert_eq!(tree.children(subgroup).len(), 1);
        assert_eq!(provider_entries(&project, 0), 1);
        assert_eq!(provider_entries(&project, 1), 0);
        assert!(tree.find_subpath(root, "B").is_none());

        assert_eq!(def.generated_targets(), vec!["A"]);
        assert_eq!(store.saved, vec!["App"]);
        // Saved, so no longer dirty.
        assert!(!project.is_dirty());
    }

    #[test]
    fn second_run_with_unchanged_inputs_is_a_noop() {
        let def = stub("/proj/Support/A");
        let mut project =
            project_with(vec![NativeTarget::new("A").with_definition(def.clone())]);
        let mut store = MemoryStore::default();

        let mut integrator = Integrator::new(&mut store);
        integrator.integrate(std::slice::from_mut(&mut project)).unwrap();
        let nodes_after_first = project.tree().node_count();

        integrator.integrate(std::slice::from_mut(&mut project)).unwrap();

        // Generator re-ran, but no new groups, entries, or saves.
        assert_eq!(def.generated_targets(), vec!["A", "A"]);
        assert_eq!(project.tree().node_count(), nodes_after_first);
        assert_eq!(provider_entries(&project, 0), 1);
        assert!(!project.is_dirty());
        assert_eq!(store.saved, vec!["App"]);
    }

    #[test]
    fn generation_order_is_sorted_by_target_name() {
        let def = stub("/proj/Support");
        let mut project = project_with(vec![
            NativeTarget::new("Zeta").with_definition(def.clone()),
            NativeTarget::new("Alpha").with_definition(def.clone()),
            NativeTarget::new("Mid").with_definition(def.clone()),
        ]);
        let mut store = MemoryStore::default();

        Integrator::new(&mut store)
            .integrate(std::slice::from_mut(&mut project))
            .unwrap();

        assert_eq!(def.generated_targets(), vec!["Alpha", "Mid", "Zeta"]);
    }

    #[test]
    fn preexisting_file_entry_still_gets_registered() {
        // The file entry can exist without a build-phase registration, e.g.
        // after an external edit. Registration is checked on its own.
        let def = stub("/proj/Support/A");
        let mut project =
            project_with(vec![NativeTarget::new("A").with_definition(def)]);
        let root = project.tree().root();
        let subgroup =
            project.ensure_group(root, &format!("{}/A", GENERATED_GROUP_NAME));
        project.new_file_in_group(
            subgroup,
            Path::new("/proj/Support/A/ModulesProvider.gen.c"),
        );
        project.mark_clean();
        let nodes_before = project.tree().node_count();

        let mut store = MemoryStore::default();
        Integrator::new(&mut store)
            .integrate(std::slice::from_mut(&mut project))
            .unwrap();

        assert_eq!(project.tree().node_count(), nodes_before);
        assert_eq!(provider_entries(&project, 0), 1);
        assert_eq!(store.saved, vec!["App"]);
    }

    #[test]
    fn dropping_the_last_participant_removes_everything() {
        let def = stub("/proj/Support/A");
        let mut project =
            project_with(vec![NativeTarget::new("A").with_definition(def.clone())]);
        let mut store = MemoryStore::default();
        let mut integrator = Integrator::new(&mut store);

        integrator.integrate(std::slice::from_mut(&mut project)).unwrap();
        assert_eq!(provider_entries(&project, 0), 1);

        // The module set shrank to zero between runs.
        def.set_needs_provider(false);
        integrator.integrate(std::slice::from_mut(&mut project)).unwrap();

        let tree = project.tree();
        assert!(tree.find_subpath(tree.root(), GENERATED_GROUP_NAME).is_none());
        assert_eq!(provider_entries(&project, 0), 0);
        assert_eq!(store.saved, vec!["App", "App"]);
    }

    #[test]
    fn stale_subgroup_is_removed_while_others_survive() {
        let def_a = stub("/proj/Support/A");
        let def_b = stub("/proj/Support/B");
        let mut project = project_with(vec![
            NativeTarget::new("A").with_definition(def_a.clone()),
            NativeTarget::new("B").with_definition(def_b.clone()),
        ]);
        let mut store = MemoryStore::default();
        let mut integrator = Integrator::new(&mut store);

        integrator.integrate(std::slice::from_mut(&mut project)).unwrap();

        def_a.set_needs_provider(false);
        integrator.integrate(std::slice::from_mut(&mut project)).unwrap();

        let tree = project.tree();
        let root = tree.find_subpath(tree.root(), GENERATED_GROUP_NAME).unwrap();
        assert!(tree.find_subpath(root, "A").is_none());
        assert!(tree.find_subpath(root, "B").is_some());
        assert_eq!(provider_entries(&project, 0), 0);
        assert_eq!(provider_entries(&project, 1), 1);
    }

    #[test]
    fn no_participants_and_no_group_means_nothing_happens() {
        let mut project = project_with(vec![NativeTarget::new("A")]);
        let mut store = MemoryStore::default();

        Integrator::new(&mut store)
            .integrate(std::slice::from_mut(&mut project))
            .unwrap();

        let tree = project.tree();
        assert!(tree.find_subpath(tree.root(), GENERATED_GROUP_NAME).is_none());
        assert!(!project.is_dirty());
        assert!(store.saved.is_empty());
    }

    #[test]
    fn generation_failure_aborts_before_save() {
        let def_ok = stub("/proj/Support/Alpha");
        let def_bad = stub("/proj/Support/Beta");
        def_bad.set_fail_generation(true);
        let mut project = project_with(vec![
            NativeTarget::new("Beta").with_definition(def_bad),
            NativeTarget::new("Alpha").with_definition(def_ok),
        ]);
        let mut store = MemoryStore::default();

        let err = Integrator::new(&mut store)
            .integrate(std::slice::from_mut(&mut project))
            .unwrap_err();

        assert!(matches!(err, IntegrateError::Generation { ref target, .. } if target == "Beta"));
        // Alpha was processed first (sorted order); its side effects remain
        // in memory but nothing reached the store.
        assert_eq!(provider_entries(&project, 1), 1);
        assert!(project.is_dirty());
        assert!(store.saved.is_empty());
    }

    #[test]
    fn scheduled_projects_are_not_double_saved() {
        let def = stub("/proj/Support/A");
        let mut project =
            project_with(vec![NativeTarget::new("A").with_definition(def)]);
        let mut store = MemoryStore::default();

        Integrator::new(&mut store)
            .with_scheduled_for_save([PathBuf::from("/proj/App.shipproj")])
            .integrate(std::slice::from_mut(&mut project))
            .unwrap();

        // The host pipeline owns this save; the dirty flag stays for it.
        assert!(store.saved.is_empty());
        assert!(project.is_dirty());
    }

    #[test]
    fn persistence_failure_propagates() {
        let def = stub("/proj/Support/A");
        let mut project =
            project_with(vec![NativeTarget::new("A").with_definition(def)]);
        let mut store = FailingStore;

        let err = Integrator::new(&mut store)
            .integrate(std::slice::from_mut(&mut project))
            .unwrap_err();

        assert!(matches!(err, IntegrateError::Persistence { ref project, .. } if project == "App"));
    }

    #[test]
    fn classifier_requires_both_presence_and_need() {
        let def = stub("/proj/Support/A");
        let with = NativeTarget::new("A").with_definition(def.clone());
        let without = NativeTarget::new("B");
        assert!(needs_provider(&with));
        assert!(!needs_provider(&without));

        def.set_needs_provider(false);
        assert!(!needs_provider(&with));
    }
}
