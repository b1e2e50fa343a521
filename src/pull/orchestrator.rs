use super::layout::{sanitize_name, ForceFilter, SyncLayout};
use super::report::PullReport;
use crate::client::ResourceSource;
use crate::config::{resolve_output_dir, SyncConfig};
use crate::error::{BqSyncError, Result};
use crate::fetch::{decide, FetchAction, LocalFile, VersionControl};
use crate::resource::ResourceKind;
use crate::writer::{
    render_external_definition, render_model_yaml, render_routine_model_yaml, render_routine_sql,
    render_saved_query_sql, render_scheduled_query_sql, render_view_model_yaml, render_view_sql,
    write_text,
};
use chrono::{DateTime, Utc};
use similar::TextDiff;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    pub dry_run: bool,
    pub force: bool,
    /// Restricts `force` to these entries; has no effect without `force`.
    pub force_files: Option<Vec<String>>,
}

/// A file to be written when its resource is fetched.
#[derive(Debug, Clone)]
struct Planned {
    path: PathBuf,
    contents: String,
}

impl Planned {
    fn new(path: PathBuf, contents: String) -> Self {
        Self { path, contents }
    }
}

/// Fails when `root` exists and holds uncommitted or untracked files. A
/// missing root has nothing to protect.
pub fn ensure_clean<V: VersionControl>(vcs: &V, root: &Path) -> Result<()> {
    if root.exists() && vcs.has_uncommitted_changes(root) {
        return Err(BqSyncError::UncommittedChanges(root.to_path_buf()));
    }
    Ok(())
}

/// Pulls one project's resources into its output root.
pub struct Puller<S, V> {
    source: S,
    vcs: V,
    layout: SyncLayout,
    datasets: Vec<String>,
    options: PullOptions,
    filter: ForceFilter,
}

impl<S: ResourceSource, V: VersionControl> Puller<S, V> {
    pub fn new(
        source: S,
        vcs: V,
        output_root: impl Into<PathBuf>,
        datasets: Vec<String>,
        options: PullOptions,
    ) -> Self {
        let filter = ForceFilter::new(options.force_files.clone().unwrap_or_default());
        Self {
            source,
            vcs,
            layout: SyncLayout::new(output_root),
            datasets,
            options,
            filter,
        }
    }

    pub fn from_config(
        source: S,
        vcs: V,
        config: &SyncConfig,
        config_path: &Path,
        options: PullOptions,
    ) -> Self {
        Self::new(
            source,
            vcs,
            resolve_output_dir(config, config_path),
            config.datasets().to_vec(),
            options,
        )
    }

    pub fn layout(&self) -> &SyncLayout {
        &self.layout
    }

    pub async fn run(&self) -> Result<PullReport> {
        ensure_clean(&self.vcs, self.layout.root())?;

        let root = self.layout.root();
        info!("Pulling into {}", root.display());
        if self.options.dry_run {
            info!("Dry run: no files will be written");
        }

        let mut report = PullReport::new(self.options.dry_run);
        for dataset in &self.datasets {
            info!("Processing dataset '{}'", dataset);
            self.pull_dataset(dataset, &mut report).await?;
        }
        self.pull_scheduled_queries(&mut report).await?;
        self.pull_saved_queries(&mut report).await?;

        let totals = report.totals();
        info!(
            "Pull complete: {} fetched, {} skipped, {} warned",
            totals.fetched, totals.skipped, totals.warned
        );
        Ok(report)
    }

    async fn pull_dataset(&self, dataset: &str, report: &mut PullReport) -> Result<()> {
        let layout = &self.layout;
        let mut model_names = HashSet::new();

        let views = self.source.list_views(dataset).await?;
        debug!("{}: {} view(s)", dataset, views.len());
        let mut names = HashSet::new();
        for view in &views {
            names.insert(view.name.clone());
            self.apply(
                report,
                ResourceKind::View,
                &view.name,
                view.modified,
                Planned::new(
                    layout.primary_path(ResourceKind::View, dataset, &view.name),
                    render_view_sql(view),
                ),
                Some(Planned::new(
                    layout.model_path(dataset, &view.name),
                    render_view_model_yaml(view),
                )),
            )?;
        }
        self.scan_orphans(
            report,
            ResourceKind::View,
            &layout.dir(ResourceKind::View, dataset),
            &names,
        )?;
        model_names.extend(names);

        let routines = self.source.list_routines(dataset).await?;
        debug!("{}: {} routine(s)", dataset, routines.len());
        let mut names = HashSet::new();
        for routine in &routines {
            names.insert(routine.name.clone());
            self.apply(
                report,
                ResourceKind::Routine,
                &routine.name,
                routine.modified,
                Planned::new(
                    layout.primary_path(ResourceKind::Routine, dataset, &routine.name),
                    render_routine_sql(routine),
                ),
                Some(Planned::new(
                    layout.model_path(dataset, &routine.name),
                    render_routine_model_yaml(routine),
                )),
            )?;
        }
        self.scan_orphans(
            report,
            ResourceKind::Routine,
            &layout.dir(ResourceKind::Routine, dataset),
            &names,
        )?;
        model_names.extend(names);

        let tables = self.source.list_tables(dataset).await?;
        debug!("{}: {} table(s)", dataset, tables.len());
        for table in &tables {
            model_names.insert(table.name.clone());
            self.apply(
                report,
                ResourceKind::Table,
                &table.name,
                table.modified,
                Planned::new(layout.model_path(dataset, &table.name), render_model_yaml(table)),
                None,
            )?;
        }

        let externals = self.source.list_external_tables(dataset).await?;
        debug!("{}: {} external table(s)", dataset, externals.len());
        for ext in &externals {
            model_names.insert(ext.name.clone());
            self.apply(
                report,
                ResourceKind::ExternalTable,
                &ext.name,
                ext.modified,
                Planned::new(
                    layout.model_path(dataset, &ext.name),
                    render_external_definition(ext),
                ),
                None,
            )?;
        }

        // models/ holds metadata for every dataset kind.
        self.scan_orphans(
            report,
            ResourceKind::Table,
            &layout.dir(ResourceKind::Table, dataset),
            &model_names,
        )
    }

    async fn pull_scheduled_queries(&self, report: &mut PullReport) -> Result<()> {
        let queries = self.source.list_scheduled_queries().await?;
        debug!("{} scheduled queries", queries.len());
        let mut names = HashSet::new();
        for query in &queries {
            names.insert(sanitize_name(&query.name));
            self.apply(
                report,
                ResourceKind::ScheduledQuery,
                &query.name,
                query.modified,
                Planned::new(
                    self.layout
                        .primary_path(ResourceKind::ScheduledQuery, "", &query.name),
                    render_scheduled_query_sql(query),
                ),
                None,
            )?;
        }
        self.scan_orphans(
            report,
            ResourceKind::ScheduledQuery,
            &self.layout.dir(ResourceKind::ScheduledQuery, ""),
            &names,
        )
    }

    // Not orphan-scanned: an empty listing may just mean the API failed.
    async fn pull_saved_queries(&self, report: &mut PullReport) -> Result<()> {
        let saved = self.source.list_saved_queries().await?;
        debug!("{} saved queries", saved.len());
        for query in &saved {
            self.apply(
                report,
                ResourceKind::SavedQuery,
                &query.name,
                query.modified,
                Planned::new(
                    self.layout
                        .primary_path(ResourceKind::SavedQuery, "", &query.name),
                    render_saved_query_sql(query),
                ),
                None,
            )?;
        }
        Ok(())
    }

    fn is_forced(&self, primary: &Planned, model: Option<&Planned>) -> bool {
        if !self.options.force {
            return false;
        }
        if self.filter.is_empty() {
            return true;
        }
        let root = self.layout.root();
        self.filter.matches(root, &primary.path)
            || model.is_some_and(|m| self.filter.matches(root, &m.path))
    }

    fn apply(
        &self,
        report: &mut PullReport,
        kind: ResourceKind,
        name: &str,
        remote_modified: DateTime<Utc>,
        primary: Planned,
        model: Option<Planned>,
    ) -> Result<()> {
        let local = LocalFile::inspect(primary.path.clone(), &self.vcs);
        let force = self.is_forced(&primary, model.as_ref());
        let decision = decide(Some(remote_modified), &local, force);

        match decision.action {
            FetchAction::Fetch => {
                if let Some(diagnostic) = &decision.diagnostic {
                    warn!("{}", diagnostic);
                }
                info!("FETCH {} {} -> {}", kind, name, primary.path.display());
                for planned in std::iter::once(primary).chain(model) {
                    if self.options.dry_run {
                        self.preview(&planned);
                    } else {
                        write_text(&planned.path, &planned.contents)?;
                    }
                }
            }
            FetchAction::Skip => debug!("SKIP {} {}", kind, name),
            FetchAction::Warn => {
                if let Some(diagnostic) = &decision.diagnostic {
                    warn!("{}", diagnostic);
                }
            }
        }

        report.record(kind, decision.action);
        Ok(())
    }

    fn preview(&self, planned: &Planned) {
        match std::fs::read_to_string(&planned.path) {
            Ok(current) if current == planned.contents => {
                debug!("unchanged {}", planned.path.display());
            }
            Ok(current) => {
                let label = planned.path.display().to_string();
                let diff = TextDiff::from_lines(&current, &planned.contents)
                    .unified_diff()
                    .context_radius(3)
                    .header(&label, &label)
                    .to_string();
                info!("would update {}\n{}", label, diff);
            }
            Err(_) => info!("would create {}", planned.path.display()),
        }
    }

    /// Local files in `dir` with no remote counterpart in `names`.
    fn scan_orphans(
        &self,
        report: &mut PullReport,
        kind: ResourceKind,
        dir: &Path,
        names: &HashSet<String>,
    ) -> Result<()> {
        if !dir.is_dir() {
            return Ok(());
        }
        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            kind.extension()
        );

        let mut orphans: Vec<PathBuf> = glob::glob(&pattern)?
            .filter_map(|entry| entry.ok())
            .filter(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|stem| !names.contains(stem))
            })
            .collect();
        orphans.sort();

        for path in orphans {
            // Nothing remote to fetch, so force never applies here.
            let decision = decide(None, &LocalFile::inspect(path, &self.vcs), false);
            if let Some(diagnostic) = &decision.diagnostic {
                warn!("{}", diagnostic);
            }
            report.record(kind, decision.action);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockSource;
    use crate::resource::{
        RoutineInfo, SavedQueryInfo, ScheduledQueryInfo, TableInfo, ViewInfo,
    };
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Commit times keyed by path, plus a dirty flag for the whole tree.
    #[derive(Default)]
    struct FakeVcs {
        commits: Mutex<HashMap<PathBuf, DateTime<Utc>>>,
        dirty: bool,
    }

    impl FakeVcs {
        fn commit(&self, path: &Path, at: DateTime<Utc>) {
            self.commits.lock().unwrap().insert(path.to_path_buf(), at);
        }
    }

    impl VersionControl for FakeVcs {
        fn committed_time(&self, file: &Path) -> Option<DateTime<Utc>> {
            self.commits.lock().unwrap().get(file).copied()
        }

        fn has_uncommitted_changes(&self, _dir: &Path) -> bool {
            self.dirty
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn source() -> MockSource {
        MockSource::new()
            .with_view("sales", ViewInfo::new("orders_v", "SELECT * FROM orders", t0()))
            .with_routine(
                "sales",
                RoutineInfo::new("add_one", "x + 1", "SQL", t0()),
            )
            .with_table("sales", TableInfo::new("orders", t0()))
            .with_scheduled_query(ScheduledQueryInfo {
                name: "nightly load".to_string(),
                sql: "INSERT INTO t SELECT 1".to_string(),
                schedule: "every 24 hours".to_string(),
                modified: t0(),
            })
            .with_saved_query(SavedQueryInfo {
                name: "top".to_string(),
                sql: "SELECT 1".to_string(),
                modified: DateTime::<Utc>::UNIX_EPOCH,
            })
    }

    fn puller<'a>(
        source: MockSource,
        vcs: &'a FakeVcs,
        root: &Path,
        options: PullOptions,
    ) -> Puller<MockSource, &'a FakeVcs> {
        Puller::new(source, vcs, root, vec!["sales".to_string()], options)
    }

    #[tokio::test]
    async fn test_first_pull_writes_everything() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        let vcs = FakeVcs::default();

        let report = puller(source(), &vcs, &root, PullOptions::default())
            .run()
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(root.join("sales/views/orders_v.sql")).unwrap(),
            "-- View: orders_v\n\nSELECT * FROM orders"
        );
        assert!(root.join("sales/models/orders_v.yaml").is_file());
        assert!(root.join("sales/routines/add_one.sql").is_file());
        assert!(root.join("sales/models/add_one.yaml").is_file());
        assert!(root.join("sales/models/orders.yaml").is_file());
        assert!(root.join("scheduled_queries/nightly_load.sql").is_file());
        assert!(root.join("saved_queries/top.sql").is_file());

        assert_eq!(report.totals().fetched, 5);
        assert_eq!(report.totals().warned, 0);
    }

    #[tokio::test]
    async fn test_dirty_tree_aborts_before_listing() {
        let tmp = TempDir::new().unwrap();
        let vcs = FakeVcs {
            dirty: true,
            ..Default::default()
        };
        let source = std::sync::Arc::new(source());

        let puller = Puller::new(
            source.clone(),
            &vcs,
            tmp.path(),
            vec!["sales".to_string()],
            PullOptions::default(),
        );
        let err = puller.run().await.unwrap_err();

        assert!(matches!(err, BqSyncError::UncommittedChanges(_)));
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_untracked_file_in_git_repo_aborts() {
        let git_ok = std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        if !git_ok {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let status = std::process::Command::new("git")
            .args(["init", "-q"])
            .current_dir(tmp.path())
            .status()
            .unwrap();
        assert!(status.success());
        let root = tmp.path().join("proj");
        let wip = root.join("sales/views/wip.sql");
        std::fs::create_dir_all(wip.parent().unwrap()).unwrap();
        std::fs::write(&wip, "SELECT 1").unwrap();
        let source = std::sync::Arc::new(source());

        let puller = Puller::new(
            source.clone(),
            crate::fetch::GitCli::new(),
            &root,
            vec!["sales".to_string()],
            PullOptions::default(),
        );
        let err = puller.run().await.unwrap_err();

        assert!(matches!(err, BqSyncError::UncommittedChanges(_)));
        assert_eq!(source.call_count(), 0);
    }

    #[test]
    fn test_ensure_clean() {
        let tmp = TempDir::new().unwrap();
        let dirty = FakeVcs {
            dirty: true,
            ..Default::default()
        };

        let err = ensure_clean(&dirty, tmp.path()).unwrap_err();
        assert!(matches!(err, BqSyncError::UncommittedChanges(ref p) if p == tmp.path()));
        assert!(ensure_clean(&dirty, &tmp.path().join("absent")).is_ok());
        assert!(ensure_clean(&FakeVcs::default(), tmp.path()).is_ok());
    }

    #[tokio::test]
    async fn test_missing_root_skips_dirty_check() {
        let tmp = TempDir::new().unwrap();
        let vcs = FakeVcs {
            dirty: true,
            ..Default::default()
        };
        let root = tmp.path().join("not-yet");

        let report = puller(MockSource::new(), &vcs, &root, PullOptions::default())
            .run()
            .await
            .unwrap();
        assert_eq!(report.totals().total(), 0);
    }

    #[tokio::test]
    async fn test_committed_files_are_compared() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        let vcs = FakeVcs::default();
        puller(source(), &vcs, &root, PullOptions::default())
            .run()
            .await
            .unwrap();

        let view = root.join("sales/views/orders_v.sql");
        let routine = root.join("sales/routines/add_one.sql");
        let model = root.join("sales/models/orders.yaml");
        std::fs::write(&view, "-- local edit").unwrap();
        std::fs::write(&model, "local").unwrap();

        // View committed after the remote change, routine committed before.
        vcs.commit(&view, t0() + Duration::hours(1));
        vcs.commit(&routine, t0() - Duration::hours(1));
        vcs.commit(&model, t0());

        let report = puller(source(), &vcs, &root, PullOptions::default())
            .run()
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&view).unwrap(), "-- local edit");
        assert_eq!(std::fs::read_to_string(&model).unwrap(), "local");
        assert_eq!(report.counts(ResourceKind::View).skipped, 1);
        assert_eq!(report.counts(ResourceKind::Routine).fetched, 1);
        assert_eq!(report.counts(ResourceKind::Table).skipped, 1);
        // Never committed: cannot compare.
        assert_eq!(report.counts(ResourceKind::ScheduledQuery).warned, 1);
        assert_eq!(report.counts(ResourceKind::SavedQuery).warned, 1);
    }

    #[tokio::test]
    async fn test_force_file_limits_overwrites() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        let vcs = FakeVcs::default();
        puller(source(), &vcs, &root, PullOptions::default())
            .run()
            .await
            .unwrap();

        let view = root.join("sales/views/orders_v.sql");
        let routine = root.join("sales/routines/add_one.sql");
        std::fs::write(&view, "stale").unwrap();
        std::fs::write(&routine, "stale").unwrap();

        let options = PullOptions {
            force: true,
            force_files: Some(vec!["orders_v.sql".to_string()]),
            ..Default::default()
        };
        let report = puller(source(), &vcs, &root, options).run().await.unwrap();

        assert!(std::fs::read_to_string(&view).unwrap().starts_with("-- View: orders_v"));
        assert_eq!(std::fs::read_to_string(&routine).unwrap(), "stale");
        assert_eq!(report.counts(ResourceKind::View).fetched, 1);
        assert_eq!(report.counts(ResourceKind::Routine).warned, 1);
    }

    #[tokio::test]
    async fn test_force_file_without_force_keeps_local_edits() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        let view = root.join("sales/views/orders_v.sql");
        std::fs::create_dir_all(view.parent().unwrap()).unwrap();
        std::fs::write(&view, "local edit").unwrap();
        let vcs = FakeVcs::default();

        let options = PullOptions {
            force_files: Some(vec!["orders_v.sql".to_string()]),
            ..Default::default()
        };
        let report = puller(source(), &vcs, &root, options).run().await.unwrap();

        assert_eq!(std::fs::read_to_string(&view).unwrap(), "local edit");
        assert_eq!(report.counts(ResourceKind::View).fetched, 0);
        assert_eq!(report.counts(ResourceKind::View).warned, 1);
    }

    #[tokio::test]
    async fn test_force_overwrites_uncommitted_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        let view = root.join("sales/views/orders_v.sql");
        std::fs::create_dir_all(view.parent().unwrap()).unwrap();
        std::fs::write(&view, "stale").unwrap();
        let vcs = FakeVcs::default();

        let options = PullOptions {
            force: true,
            ..Default::default()
        };
        let report = puller(source(), &vcs, &root, options).run().await.unwrap();

        assert_ne!(std::fs::read_to_string(&view).unwrap(), "stale");
        assert_eq!(report.totals().warned, 0);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        let vcs = FakeVcs::default();
        let options = PullOptions {
            dry_run: true,
            ..Default::default()
        };

        let report = puller(source(), &vcs, &root, options).run().await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.totals().fetched, 5);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_orphans_are_warned_and_kept() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        let orphan_view = root.join("sales/views/dropped_v.sql");
        let orphan_model = root.join("sales/models/dropped_t.yaml");
        let orphan_query = root.join("scheduled_queries/old_job.sql");
        let orphan_saved = root.join("saved_queries/gone.sql");
        for path in [&orphan_view, &orphan_model, &orphan_query, &orphan_saved] {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "keep me").unwrap();
        }
        let vcs = FakeVcs::default();

        let report = puller(source(), &vcs, &root, PullOptions::default())
            .run()
            .await
            .unwrap();

        for path in [&orphan_view, &orphan_model, &orphan_query, &orphan_saved] {
            assert_eq!(std::fs::read_to_string(path).unwrap(), "keep me");
        }
        assert_eq!(report.counts(ResourceKind::View).warned, 1);
        assert_eq!(report.counts(ResourceKind::Table).warned, 1);
        assert_eq!(report.counts(ResourceKind::ScheduledQuery).warned, 1);
        // Saved queries are not scanned.
        assert_eq!(report.counts(ResourceKind::SavedQuery).warned, 0);
        // The view's own model file is not an orphan.
        assert_eq!(report.counts(ResourceKind::Table).fetched, 1);
    }

    #[test]
    fn test_from_config_resolves_root() {
        let config = SyncConfig::from_toml(
            r#"
[project]
id = "proj"
default_region = "us"

[sync]
datasets = ["a", "b"]
output_dir = "out"
"#,
        )
        .unwrap();
        let vcs = FakeVcs::default();
        let puller = Puller::from_config(
            MockSource::new(),
            &vcs,
            &config,
            Path::new("/repo/bq_sync.toml"),
            PullOptions::default(),
        );
        assert_eq!(puller.layout().root(), Path::new("/repo/out/proj"));
        assert_eq!(puller.datasets, ["a", "b"]);
    }
}
