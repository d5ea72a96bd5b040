#[cfg(test)]
mod tests {
    use crate::errors::{Error, PersistenceError, Result, ValidationError};
    use crate::events::{DomainEvent, MockDomainEventSink, NoOpDomainEventSink};
    use crate::goals::{
        Goal, GoalCategory, GoalInsert, GoalRepositoryTrait, GoalStatus, GoalStore,
        GoalStoreTrait, GoalUpdate, IdentityProviderTrait, NewGoal,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // --- Mock remote store ---
    struct MockGoalRepository {
        rows: Mutex<Vec<Goal>>,
        calls: Mutex<Vec<String>>,
        failing: AtomicBool,
        inserted: AtomicUsize,
    }

    impl MockGoalRepository {
        fn new(rows: Vec<Goal>) -> Self {
            Self {
                rows: Mutex::new(rows),
                calls: Mutex::new(Vec::new()),
                failing: AtomicBool::new(false),
                inserted: AtomicUsize::new(0),
            }
        }

        fn fail(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &str) -> Result<()> {
            self.calls.lock().unwrap().push(call.to_string());
            if self.failing.load(Ordering::SeqCst) {
                return Err(PersistenceError::Transport("connection reset".to_string()).into());
            }
            Ok(())
        }

        fn remove_row(&self, goal_id: &str) {
            self.rows.lock().unwrap().retain(|g| g.id != goal_id);
        }
    }

    #[async_trait]
    impl GoalRepositoryTrait for MockGoalRepository {
        async fn list_goals(&self, owner_id: &str) -> Result<Vec<Goal>> {
            self.record("list")?;
            let mut goals: Vec<Goal> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|g| g.owner_id == owner_id)
                .cloned()
                .collect();
            goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(goals)
        }

        async fn insert_goal(&self, owner_id: &str, new_goal: GoalInsert) -> Result<Goal> {
            self.record("insert")?;
            let n = self.inserted.fetch_add(1, Ordering::SeqCst) as i64;
            let ts = base_time() + Duration::days(30) + Duration::seconds(n);
            let goal = Goal {
                id: uuid::Uuid::new_v4().to_string(),
                title: new_goal.title,
                description: new_goal.description,
                category: new_goal.category,
                target_date: Some(new_goal.target_date),
                hours_per_week: new_goal.hours_per_week,
                progress_percentage: new_goal.progress_percentage,
                status: new_goal.status,
                streak: new_goal.streak,
                owner_id: owner_id.to_string(),
                created_at: ts,
                updated_at: ts,
            };
            self.rows.lock().unwrap().push(goal.clone());
            Ok(goal)
        }

        async fn update_goal(&self, goal_id: &str, changes: GoalUpdate) -> Result<Goal> {
            self.record("update")?;
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|g| g.id == goal_id)
                .ok_or_else(|| Error::NotFound(goal_id.to_string()))?;
            changes.apply_to(row);
            row.updated_at += Duration::minutes(1);
            Ok(row.clone())
        }

        async fn delete_goal(&self, goal_id: &str) -> Result<()> {
            self.record("delete")?;
            self.remove_row(goal_id);
            Ok(())
        }
    }

    // --- Mock identity ---
    struct MockIdentity {
        user_id: Mutex<Option<String>>,
    }

    impl MockIdentity {
        fn signed_in(user_id: &str) -> Self {
            Self {
                user_id: Mutex::new(Some(user_id.to_string())),
            }
        }

        fn set(&self, user_id: Option<&str>) {
            *self.user_id.lock().unwrap() = user_id.map(str::to_string);
        }
    }

    impl IdentityProviderTrait for MockIdentity {
        fn current_user_id(&self) -> Option<String> {
            self.user_id.lock().unwrap().clone()
        }
    }

    // --- Fixtures ---
    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    fn goal(id: &str, owner: &str, days: i64, status: GoalStatus, progress: i32) -> Goal {
        let ts = base_time() + Duration::days(days);
        Goal {
            id: id.to_string(),
            title: format!("Goal {}", id),
            description: "Study plan".to_string(),
            category: GoalCategory::Programming,
            target_date: NaiveDate::from_ymd_opt(2024, 12, 31),
            hours_per_week: 5,
            progress_percentage: progress,
            status,
            streak: 0,
            owner_id: owner.to_string(),
            created_at: ts,
            updated_at: ts,
        }
    }

    fn seeded_rows() -> Vec<Goal> {
        vec![
            goal("g1", "user-1", 1, GoalStatus::Active, 50),
            goal("g2", "user-1", 3, GoalStatus::Active, 95),
            goal("g3", "user-1", 2, GoalStatus::Completed, 100),
            goal("g9", "user-2", 4, GoalStatus::Active, 10),
        ]
    }

    fn new_goal() -> NewGoal {
        NewGoal {
            title: "Learn Spanish".to_string(),
            description: "Reach B1 level".to_string(),
            category: Some(GoalCategory::Language),
            target_date: NaiveDate::from_ymd_opt(2024, 9, 1),
            hours_per_week: Some(4),
        }
    }

    struct Harness {
        store: GoalStore,
        repo: Arc<MockGoalRepository>,
        identity: Arc<MockIdentity>,
        sink: MockDomainEventSink,
    }

    fn harness(rows: Vec<Goal>) -> Harness {
        let repo = Arc::new(MockGoalRepository::new(rows));
        let identity = Arc::new(MockIdentity::signed_in("user-1"));
        let sink = MockDomainEventSink::new();
        let store = GoalStore::new(repo.clone(), identity.clone(), Arc::new(sink.clone()));
        Harness {
            store,
            repo,
            identity,
            sink,
        }
    }

    async fn loaded_harness() -> Harness {
        let h = harness(seeded_rows());
        h.store.load().await.unwrap();
        h.sink.clear();
        h
    }

    fn ids(goals: &[Goal]) -> Vec<&str> {
        goals.iter().map(|g| g.id.as_str()).collect()
    }

    // --- load ---

    #[tokio::test]
    async fn test_load_replaces_collection_newest_first() {
        let h = harness(seeded_rows());
        let goals = h.store.load().await.unwrap();

        assert_eq!(ids(&goals), vec!["g2", "g3", "g1"]);
        let snapshot = h.store.snapshot();
        assert_eq!(ids(&snapshot.goals), vec!["g2", "g3", "g1"]);
        assert!(!snapshot.loading);
        assert!(snapshot.error.is_none());
        assert_eq!(
            h.sink.events(),
            vec![DomainEvent::goals_loaded("user-1".to_string(), 3)]
        );
    }

    #[tokio::test]
    async fn test_load_drops_rows_of_other_owners() {
        struct LeakyRepository(Vec<Goal>);

        #[async_trait]
        impl GoalRepositoryTrait for LeakyRepository {
            async fn list_goals(&self, _owner_id: &str) -> Result<Vec<Goal>> {
                Ok(self.0.clone())
            }
            async fn insert_goal(&self, _: &str, _: GoalInsert) -> Result<Goal> {
                unimplemented!()
            }
            async fn update_goal(&self, _: &str, _: GoalUpdate) -> Result<Goal> {
                unimplemented!()
            }
            async fn delete_goal(&self, _: &str) -> Result<()> {
                unimplemented!()
            }
        }

        let store = GoalStore::new(
            Arc::new(LeakyRepository(seeded_rows())),
            Arc::new(MockIdentity::signed_in("user-1")),
            Arc::new(MockDomainEventSink::new()),
        );
        let goals = store.load().await.unwrap();
        assert_eq!(ids(&goals), vec!["g2", "g3", "g1"]);
        assert!(store.goals().iter().all(|g| g.owner_id == "user-1"));
    }

    #[tokio::test]
    async fn test_first_load_failure_leaves_collection_empty() {
        let h = harness(seeded_rows());
        h.repo.fail(true);

        let result = h.store.load().await;
        assert!(matches!(result, Err(Error::Persistence(_))));

        let snapshot = h.store.snapshot();
        assert!(snapshot.goals.is_empty());
        assert!(!snapshot.loading);
        assert!(snapshot.error.unwrap().contains("connection reset"));
        assert!(matches!(
            h.sink.events().as_slice(),
            [DomainEvent::GoalsLoadFailed { .. }]
        ));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_snapshot() {
        let h = loaded_harness().await;
        let before = h.store.goals();

        h.repo.fail(true);
        assert!(h.store.load().await.is_err());
        assert_eq!(h.store.goals(), before);
        assert!(h.store.error().is_some());

        h.repo.fail(false);
        h.store.load().await.unwrap();
        assert!(h.store.error().is_none());
    }

    #[tokio::test]
    async fn test_repeated_load_is_idempotent() {
        let h = harness(seeded_rows());
        let first = h.store.load().await.unwrap();
        let second = h.store.load().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(h.store.goals().len(), 3);
    }

    #[tokio::test]
    async fn test_load_without_user() {
        let h = harness(seeded_rows());
        h.identity.set(None);

        assert!(matches!(h.store.load().await, Err(Error::NotAuthenticated)));
        assert!(h.repo.calls().is_empty());
        assert!(h.store.error().is_some());
    }

    #[tokio::test]
    async fn test_switching_user_drops_previous_goals() {
        let h = loaded_harness().await;
        h.identity.set(Some("user-2"));

        h.repo.fail(true);
        assert!(h.store.load().await.is_err());
        assert!(h.store.goals().is_empty());

        h.repo.fail(false);
        let goals = h.store.load().await.unwrap();
        assert_eq!(ids(&goals), vec!["g9"]);
    }

    #[tokio::test]
    async fn test_goal_created_across_user_switch_is_not_cached() {
        struct GatedInsertRepository {
            inner: MockGoalRepository,
            gate: tokio::sync::Notify,
        }

        #[async_trait]
        impl GoalRepositoryTrait for GatedInsertRepository {
            async fn list_goals(&self, owner_id: &str) -> Result<Vec<Goal>> {
                self.inner.list_goals(owner_id).await
            }
            async fn insert_goal(&self, owner_id: &str, new_goal: GoalInsert) -> Result<Goal> {
                self.gate.notified().await;
                self.inner.insert_goal(owner_id, new_goal).await
            }
            async fn update_goal(&self, goal_id: &str, changes: GoalUpdate) -> Result<Goal> {
                self.inner.update_goal(goal_id, changes).await
            }
            async fn delete_goal(&self, goal_id: &str) -> Result<()> {
                self.inner.delete_goal(goal_id).await
            }
        }

        let repo = Arc::new(GatedInsertRepository {
            inner: MockGoalRepository::new(seeded_rows()),
            gate: tokio::sync::Notify::new(),
        });
        let identity = Arc::new(MockIdentity::signed_in("user-1"));
        let sink = MockDomainEventSink::new();
        let store = GoalStore::new(repo.clone(), identity.clone(), Arc::new(sink.clone()));
        store.load().await.unwrap();
        sink.clear();

        let switch_user = async {
            identity.set(Some("user-2"));
            let goals = store.load().await.unwrap();
            repo.gate.notify_one();
            goals
        };
        let (created, user_2_goals) = tokio::join!(store.create_goal(new_goal()), switch_user);

        let created = created.unwrap();
        assert_eq!(created.owner_id, "user-1");
        assert_eq!(ids(&user_2_goals), vec!["g9"]);
        assert_eq!(ids(&store.goals()), vec!["g9"]);
        assert!(store.goals().iter().all(|g| g.owner_id == "user-2"));
        assert!(store.get_goal(&created.id).is_none());
        assert!(!store.is_mutating());
        assert!(!sink
            .events()
            .iter()
            .any(|e| matches!(e, DomainEvent::GoalCreated { .. })));
    }

    #[tokio::test]
    async fn test_sign_out_drops_cached_goals() {
        let h = loaded_harness().await;
        h.identity.set(None);

        let result = h.store.delete_goal("g1").await;
        assert!(matches!(result, Err(Error::NotAuthenticated)));
        assert!(h.store.goals().is_empty());
    }

    // --- create ---

    #[tokio::test]
    async fn test_create_goal_prepends_active_goal() {
        let h = loaded_harness().await;
        let before = h.store.goals().len();

        let created = h.store.create_goal(new_goal()).await.unwrap();

        assert_eq!(created.progress_percentage, 0);
        assert_eq!(created.status, GoalStatus::Active);
        assert_eq!(created.owner_id, "user-1");
        let goals = h.store.goals();
        assert_eq!(goals.len(), before + 1);
        assert_eq!(goals[0], created);
        assert_eq!(
            h.sink.events(),
            vec![DomainEvent::goal_created(created.id.clone())]
        );
    }

    #[tokio::test]
    async fn test_create_goal_validation_skips_remote() {
        let h = loaded_harness().await;
        let calls_before = h.repo.calls().len();

        let mut input = new_goal();
        input.description = String::new();
        assert!(matches!(
            h.store.create_goal(input).await,
            Err(Error::Validation(ValidationError::MissingField(_)))
        ));

        let mut input = new_goal();
        input.hours_per_week = Some(0);
        assert!(matches!(
            h.store.create_goal(input).await,
            Err(Error::Validation(ValidationError::OutOfRange { .. }))
        ));

        assert_eq!(h.repo.calls().len(), calls_before);
        assert_eq!(h.store.goals().len(), 3);
    }

    #[tokio::test]
    async fn test_create_goal_requires_user() {
        let h = harness(Vec::new());
        h.identity.set(None);

        let result = h.store.create_goal(new_goal()).await;
        assert!(matches!(result, Err(Error::NotAuthenticated)));
        assert!(h.repo.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_goal_remote_failure_leaves_collection() {
        let h = loaded_harness().await;
        let before = h.store.goals();
        h.repo.fail(true);

        let result = h.store.create_goal(new_goal()).await;
        assert!(matches!(result, Err(Error::Persistence(_))));
        assert_eq!(h.store.goals(), before);
        assert!(h.sink.events().is_empty());
        assert!(!h.store.snapshot().mutating);
    }

    // --- update ---

    #[tokio::test]
    async fn test_update_category_keeps_other_fields() {
        let h = loaded_harness().await;
        let before = h.store.get_goal("g1").unwrap();

        let changes = GoalUpdate {
            category: Some(GoalCategory::Design),
            ..Default::default()
        };
        h.store.update_goal("g1", changes).await.unwrap();

        let after = h.store.get_goal("g1").unwrap();
        assert_eq!(after.category, GoalCategory::Design);
        assert_eq!(after.title, before.title);
        assert_eq!(after.description, before.description);
        assert_eq!(after.hours_per_week, before.hours_per_week);
        assert_eq!(after.progress_percentage, before.progress_percentage);
        assert_eq!(after.status, before.status);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_update_keeps_position() {
        let h = loaded_harness().await;
        h.store
            .update_goal(
                "g3",
                GoalUpdate {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let goals = h.store.goals();
        assert_eq!(ids(&goals), vec!["g2", "g3", "g1"]);
        assert_eq!(goals[1].title, "Renamed");
        assert_eq!(
            h.sink.events(),
            vec![DomainEvent::goal_updated(
                "g3".to_string(),
                vec!["title".to_string()]
            )]
        );
    }

    #[tokio::test]
    async fn test_update_untracked_goal_is_not_found() {
        let h = loaded_harness().await;
        let calls_before = h.repo.calls().len();

        let result = h.store.update_goal("missing", GoalUpdate::progress(10)).await;
        assert!(matches!(result, Err(Error::NotFound(id)) if id == "missing"));
        assert_eq!(h.repo.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_update_remote_not_found_retains_entry() {
        let h = loaded_harness().await;
        h.repo.remove_row("g1");

        let result = h.store.update_goal("g1", GoalUpdate::progress(70)).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(h.store.get_goal("g1").unwrap().progress_percentage, 50);
    }

    #[tokio::test]
    async fn test_update_remote_failure_retains_entry() {
        let h = loaded_harness().await;
        h.repo.fail(true);

        let result = h.store.pause_goal("g1").await;
        assert!(matches!(result, Err(Error::Persistence(_))));
        assert_eq!(h.store.get_goal("g1").unwrap().status, GoalStatus::Active);
        assert!(h.sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_completed_goal_cannot_be_reactivated() {
        let h = loaded_harness().await;
        let calls_before = h.repo.calls().len();

        let result = h.store.resume_goal("g3").await;
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InvalidStatusTransition { .. }))
        ));
        let result = h.store.pause_goal("g3").await;
        assert!(result.is_err());
        assert_eq!(h.repo.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_pause_and_resume() {
        let h = loaded_harness().await;
        let paused = h.store.pause_goal("g1").await.unwrap();
        assert_eq!(paused.status, GoalStatus::Paused);
        let resumed = h.store.resume_goal("g1").await.unwrap();
        assert_eq!(resumed.status, GoalStatus::Active);
    }

    #[tokio::test]
    async fn test_complete_goal_emits_completion() {
        let h = loaded_harness().await;
        let completed = h.store.complete_goal("g1").await.unwrap();
        assert_eq!(completed.status, GoalStatus::Completed);
        assert_eq!(completed.progress_percentage, 50);
        assert!(h
            .sink
            .events()
            .contains(&DomainEvent::goal_completed("g1".to_string(), GoalStatus::Active)));
    }

    #[tokio::test]
    async fn test_setting_full_progress_completes_goal() {
        let h = loaded_harness().await;
        let updated = h
            .store
            .update_goal("g1", GoalUpdate::progress(100))
            .await
            .unwrap();
        assert_eq!(updated.status, GoalStatus::Completed);
    }

    // --- increment_progress ---

    #[tokio::test]
    async fn test_increment_progress_to_completion() {
        let h = loaded_harness().await;
        let updated = h.store.increment_progress("g2", 10).await.unwrap();

        assert_eq!(updated.progress_percentage, 100);
        assert_eq!(updated.status, GoalStatus::Completed);
        assert_eq!(h.store.get_goal("g2").unwrap(), updated);
        assert_eq!(
            h.sink.events(),
            vec![
                DomainEvent::goal_updated(
                    "g2".to_string(),
                    vec!["progressPercentage".to_string(), "status".to_string()]
                ),
                DomainEvent::goal_completed("g2".to_string(), GoalStatus::Active),
            ]
        );
    }

    #[tokio::test]
    async fn test_increment_progress_keeps_status_below_full() {
        let h = loaded_harness().await;
        let updated = h.store.log_progress("g1").await.unwrap();

        assert_eq!(updated.progress_percentage, 60);
        assert_eq!(updated.status, GoalStatus::Active);
    }

    #[tokio::test]
    async fn test_increment_progress_rejects_non_positive_step() {
        let h = loaded_harness().await;
        assert!(matches!(
            h.store.increment_progress("g1", 0).await,
            Err(Error::Validation(_))
        ));
        assert!(h.store.increment_progress("g1", -5).await.is_err());
    }

    #[tokio::test]
    async fn test_increment_progress_on_untracked_goal() {
        let h = loaded_harness().await;
        assert!(matches!(
            h.store.increment_progress("nope", 10).await,
            Err(Error::NotFound(_))
        ));
    }

    // --- delete ---

    #[tokio::test]
    async fn test_delete_goal_removes_entry() {
        let h = loaded_harness().await;
        h.store.delete_goal("g3").await.unwrap();

        assert_eq!(ids(&h.store.goals()), vec!["g2", "g1"]);
        assert_eq!(
            h.sink.events(),
            vec![DomainEvent::goal_deleted("g3".to_string())]
        );
    }

    #[tokio::test]
    async fn test_delete_untracked_goal_skips_remote() {
        let h = loaded_harness().await;
        let before = h.store.goals();
        let calls_before = h.repo.calls().len();

        let result = h.store.delete_goal("g9").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(h.store.goals(), before);
        assert_eq!(h.repo.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_delete_failure_retains_entry() {
        let h = loaded_harness().await;
        h.repo.fail(true);

        assert!(h.store.delete_goal("g1").await.is_err());
        assert!(h.store.get_goal("g1").is_some());
    }

    // --- read model ---

    #[tokio::test]
    async fn test_stats_follow_collection() {
        let h = loaded_harness().await;
        let stats = h.store.stats();
        assert_eq!(stats.active_count, 2);
        assert_eq!(stats.completed_count, 1);
        assert_eq!(stats.total_weekly_hours, 10);
        assert!((stats.average_progress - 72.5).abs() < f64::EPSILON);

        h.store.increment_progress("g2", 10).await.unwrap();
        let stats = h.store.stats();
        assert_eq!(stats.active_count, 1);
        assert_eq!(stats.completed_count, 2);
    }

    #[tokio::test]
    async fn test_flags_raised_while_remote_call_is_pending() {
        struct GatedRepository {
            inner: MockGoalRepository,
            gate: tokio::sync::Notify,
        }

        #[async_trait]
        impl GoalRepositoryTrait for GatedRepository {
            async fn list_goals(&self, owner_id: &str) -> Result<Vec<Goal>> {
                self.gate.notified().await;
                self.inner.list_goals(owner_id).await
            }
            async fn insert_goal(&self, owner_id: &str, new_goal: GoalInsert) -> Result<Goal> {
                self.inner.insert_goal(owner_id, new_goal).await
            }
            async fn update_goal(&self, goal_id: &str, changes: GoalUpdate) -> Result<Goal> {
                self.gate.notified().await;
                self.inner.update_goal(goal_id, changes).await
            }
            async fn delete_goal(&self, goal_id: &str) -> Result<()> {
                self.inner.delete_goal(goal_id).await
            }
        }

        let repo = Arc::new(GatedRepository {
            inner: MockGoalRepository::new(seeded_rows()),
            gate: tokio::sync::Notify::new(),
        });
        let store = Arc::new(GoalStore::new(
            repo.clone(),
            Arc::new(MockIdentity::signed_in("user-1")),
            Arc::new(NoOpDomainEventSink),
        ));

        let loading = tokio::spawn({
            let store = store.clone();
            async move { store.load().await }
        });
        while !store.is_loading() {
            tokio::task::yield_now().await;
        }
        assert!(!store.is_mutating());
        repo.gate.notify_one();
        loading.await.unwrap().unwrap();
        assert!(!store.is_loading());

        let pausing = tokio::spawn({
            let store = store.clone();
            async move { store.pause_goal("g1").await }
        });
        while !store.is_mutating() {
            tokio::task::yield_now().await;
        }
        assert!(store.snapshot().mutating);
        assert_eq!(store.get_goal("g1").unwrap().status, GoalStatus::Active);
        repo.gate.notify_one();
        pausing.await.unwrap().unwrap();

        assert!(!store.is_mutating());
        assert_eq!(store.get_goal("g1").unwrap().status, GoalStatus::Paused);
    }

    #[tokio::test]
    async fn test_clear_resets_state() {
        let h = loaded_harness().await;
        h.store.clear();
        assert_eq!(h.store.snapshot(), Default::default());
    }
}
