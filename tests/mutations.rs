#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use todosync::api::local::LocalTransport;
    use todosync::api::procedures::Procedure;
    use todosync::api::RpcClient;
    use todosync::db::db::Db;
    use todosync::libs::error::RpcError;
    use todosync::libs::surface::{Surface, SurfaceKind, SurfaceOptions};
    use todosync::libs::sync_bus::{BroadcastHub, NotificationTransport, SYNC_CHANNEL};
    use todosync::libs::todo::{NewTodo, Todo, TodoId, TodoPatch};
    use todosync::server::auth::Authenticator;
    use todosync::server::handlers::TodoRouter;

    const ALICE: &str = "mock:alice";
    const WAIT: Duration = Duration::from_secs(2);

    fn router() -> Arc<TodoRouter> {
        Arc::new(TodoRouter::new(Db::in_memory().unwrap(), Authenticator::mock()))
    }

    async fn open(router: &Arc<TodoRouter>, latency: Duration) -> Surface {
        let transport = LocalTransport::new(router.clone()).with_latency(latency);
        let client = RpcClient::new(Arc::new(transport)).with_credential(ALICE);
        let bus: Arc<dyn NotificationTransport> = Arc::new(BroadcastHub::new().join(SYNC_CHANNEL));
        let options = SurfaceOptions {
            placeholder_seed: Some(1001),
            ..SurfaceOptions::default()
        };
        Surface::open_with(SurfaceKind::Main, client, bus, options).await.unwrap()
    }

    /// Writes straight into the store, the way another window would.
    fn seed(router: &TodoRouter, who: &str, text: &str) -> Todo {
        let value = router.dispatch(Some(who), Procedure::TodoCreate, json!({ "text": text })).unwrap();
        serde_json::from_value(value).unwrap()
    }

    fn texts(todos: &[Todo]) -> Vec<String> {
        todos.iter().map(|todo| todo.text.clone()).collect()
    }

    #[tokio::test]
    async fn test_create_shows_placeholder_then_server_id() {
        let router = router();
        for i in 0..41 {
            seed(&router, "mock:someone-else", &format!("filler {}", i));
        }
        let surface = open(&router, Duration::from_millis(50)).await;
        assert!(surface.todos().is_empty());

        let mutations = surface.mutations().clone();
        let create = tokio::spawn(async move { mutations.create(NewTodo::new("Buy milk")).await });

        let shown = surface
            .wait_until(WAIT, |todos| todos.iter().any(|todo| todo.id == TodoId::Pending(1001)))
            .await;
        assert!(shown, "placeholder never rendered");
        let placeholder = surface.find(TodoId::Pending(1001)).unwrap();
        assert_eq!(placeholder.text, "Buy milk");
        assert_eq!(placeholder.id.to_wire(), -1001);

        let created = create.await.unwrap().unwrap();
        assert_eq!(created.id, TodoId::Persisted(42));

        let todos = surface.todos();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].id, TodoId::Persisted(42));
        assert!(surface.find(TodoId::Pending(1001)).is_none());
    }

    #[tokio::test]
    async fn test_failed_create_is_rolled_back() {
        let router = router();
        seed(&router, ALICE, "existing");
        let surface = open(&router, Duration::from_millis(5)).await;

        let err = surface.mutations().create(NewTodo::new("   ")).await.unwrap_err();
        assert!(matches!(err, RpcError::BadRequest(_)));
        assert_eq!(texts(&surface.todos()), vec!["existing"]);
    }

    #[tokio::test]
    async fn test_failed_update_restores_server_state() {
        let router = router();
        let todo = seed(&router, ALICE, "original");
        let surface = open(&router, Duration::from_millis(5)).await;

        let patch = TodoPatch::text("x".repeat(501));
        let err = surface.mutations().update(todo.id, patch).await.unwrap_err();
        assert!(matches!(err, RpcError::BadRequest(_)));
        assert_eq!(surface.find(todo.id).unwrap().text, "original");
    }

    #[tokio::test]
    async fn test_update_and_toggle_reconcile() {
        let router = router();
        let todo = seed(&router, ALICE, "draft");
        let surface = open(&router, Duration::from_millis(5)).await;

        let updated = surface.mutations().update(todo.id, TodoPatch::text("final")).await.unwrap().unwrap();
        assert_eq!(updated.text, "final");
        assert_eq!(surface.find(todo.id).unwrap().text, "final");

        let toggled = surface.mutations().toggle(todo.id).await.unwrap().unwrap();
        assert!(toggled.completed);
        assert_eq!(surface.completed().len(), 1);
        assert!(surface.pending().is_empty());

        let reopened = surface.mutations().update(todo.id, TodoPatch::completed(false)).await.unwrap().unwrap();
        assert!(!reopened.completed);
        assert_eq!(surface.pending().len(), 1);
    }

    #[tokio::test]
    async fn test_pending_ids_are_ignored_by_the_server() {
        let router = router();
        let surface = open(&router, Duration::from_millis(5)).await;

        assert_eq!(surface.mutations().toggle(TodoId::Pending(7)).await.unwrap(), None);
        assert_eq!(surface.mutations().update(TodoId::Pending(7), TodoPatch::text("x")).await.unwrap(), None);
        surface.mutations().delete(TodoId::Pending(7)).await.unwrap();
    }

    #[tokio::test]
    async fn test_todo_deleted_elsewhere_drops_out() {
        let router = router();
        let todo = seed(&router, ALICE, "doomed");
        let surface = open(&router, Duration::from_millis(5)).await;
        assert!(surface.find(todo.id).is_some());

        router
            .dispatch(Some(ALICE), Procedure::TodoDelete, json!({ "id": todo.id.to_wire() }))
            .unwrap();

        assert_eq!(surface.mutations().toggle(todo.id).await.unwrap(), None);
        assert!(surface.find(todo.id).is_none());

        // Deleting it again is not an error either.
        surface.mutations().delete(todo.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_and_clear_completed() {
        let router = router();
        let keep = seed(&router, ALICE, "keep");
        let gone = seed(&router, ALICE, "gone");
        let done = seed(&router, ALICE, "done");
        let surface = open(&router, Duration::from_millis(5)).await;

        surface.mutations().delete(gone.id).await.unwrap();
        surface.mutations().toggle(done.id).await.unwrap();
        assert_eq!(surface.mutations().clear_completed().await.unwrap(), 1);

        assert_eq!(texts(&surface.todos()), vec!["keep"]);
        assert_eq!(surface.todos()[0].id, keep.id);
    }

    #[tokio::test]
    async fn test_reorder_moves_and_persists() {
        let router = router();
        let a = seed(&router, ALICE, "A");
        let b = seed(&router, ALICE, "B");
        let c = seed(&router, ALICE, "C");
        let surface = open(&router, Duration::from_millis(5)).await;
        assert_eq!(texts(&surface.pending()), vec!["C", "B", "A"]);

        assert!(surface.mutations().reorder(a.id, c.id).await.unwrap());
        assert_eq!(texts(&surface.pending()), vec!["A", "C", "B"]);
        let orders: Vec<i64> = surface.pending().iter().map(|todo| todo.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);

        // A fresh surface sees the persisted order.
        let other = open(&router, Duration::ZERO).await;
        assert_eq!(texts(&other.pending()), vec!["A", "C", "B"]);

        assert!(!surface.mutations().reorder(b.id, b.id).await.unwrap());
        assert!(!surface.mutations().reorder(b.id, TodoId::Persisted(999)).await.unwrap());
    }

    #[tokio::test]
    async fn test_reorder_shows_before_the_server_answers() {
        let router = router();
        let a = seed(&router, ALICE, "A");
        let b = seed(&router, ALICE, "B");
        let surface = open(&router, Duration::from_millis(50)).await;
        assert_eq!(texts(&surface.pending()), vec!["B", "A"]);

        let mutations = surface.mutations().clone();
        let reorder = tokio::spawn(async move { mutations.reorder(a.id, b.id).await });

        let moved = surface
            .wait_until(WAIT, |todos| texts(todos) == vec!["A".to_string(), "B".to_string()])
            .await;
        assert!(moved);
        assert!(reorder.await.unwrap().unwrap());
        assert_eq!(texts(&surface.pending()), vec!["A", "B"]);
    }
}
