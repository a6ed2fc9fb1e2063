#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use todosync::api::local::LocalTransport;
    use todosync::api::procedures::Procedure;
    use todosync::api::RpcClient;
    use todosync::db::db::Db;
    use todosync::libs::error::RpcResult;
    use todosync::libs::surface::{Surface, SurfaceKind};
    use todosync::libs::sync_bus::{ShellKind, SyncEnvironment};
    use todosync::libs::todo::{NewTodo, Todo, TodoPatch};
    use todosync::server::auth::Authenticator;
    use todosync::server::handlers::TodoRouter;

    const WAIT: Duration = Duration::from_secs(2);

    struct Windows {
        main: Surface,
        floating: Surface,
    }

    async fn open(router: &Arc<TodoRouter>, environment: &SyncEnvironment, kind: SurfaceKind, who: &str) -> Surface {
        open_slow(router, environment, kind, who, Duration::from_millis(5)).await
    }

    async fn open_slow(
        router: &Arc<TodoRouter>,
        environment: &SyncEnvironment,
        kind: SurfaceKind,
        who: &str,
        latency: Duration,
    ) -> Surface {
        let transport = LocalTransport::new(router.clone()).with_latency(latency);
        let client = RpcClient::new(Arc::new(transport)).with_credential(who);
        Surface::open(kind, client, environment.transport_for()).await.unwrap()
    }

    fn seed(router: &TodoRouter, text: &str) -> Todo {
        let value = router
            .dispatch(Some("mock:alice"), Procedure::TodoCreate, json!({ "text": text }))
            .unwrap();
        serde_json::from_value(value).unwrap()
    }

    /// A reorder batch may name a task the other window deleted meanwhile.
    fn tolerate_lost_race(result: RpcResult<bool>) {
        if let Err(e) = result {
            assert!(e.is_not_found(), "reorder failed: {}", e);
        }
    }

    async fn windows(shell: ShellKind) -> (Arc<TodoRouter>, SyncEnvironment, Windows) {
        let router = Arc::new(TodoRouter::new(Db::in_memory().unwrap(), Authenticator::mock()));
        let environment = SyncEnvironment::for_shell(shell);
        let main = open(&router, &environment, SurfaceKind::Main, "mock:alice").await;
        let floating = open(&router, &environment, SurfaceKind::Floating, "mock:alice").await;
        (router, environment, Windows { main, floating })
    }

    async fn converge(shell: ShellKind) {
        let (_router, _environment, w) = windows(shell).await;
        assert_ne!(w.main.id(), w.floating.id());

        let todo = w.main.mutations().create(NewTodo::new("Buy milk")).await.unwrap();
        assert!(
            w.floating.wait_until(WAIT, |todos| todos.iter().any(|t| t.id == todo.id)).await,
            "create never reached the floating window"
        );

        w.floating.mutations().update(todo.id, TodoPatch::text("Buy oat milk")).await.unwrap();
        assert!(
            w.main
                .wait_until(WAIT, |todos| todos.iter().any(|t| t.text == "Buy oat milk"))
                .await
        );

        w.main.mutations().delete(todo.id).await.unwrap();
        assert!(
            w.floating.wait_until(WAIT, |todos| todos.is_empty()).await,
            "delete never reached the floating window"
        );
    }

    #[tokio::test]
    async fn test_web_windows_converge() {
        converge(ShellKind::Web).await;
    }

    #[tokio::test]
    async fn test_desktop_windows_converge() {
        converge(ShellKind::Desktop).await;
    }

    async fn converge_under_concurrent_writes(shell: ShellKind) {
        let router = Arc::new(TodoRouter::new(Db::in_memory().unwrap(), Authenticator::mock()));
        let seeded: Vec<Todo> = (0..8).map(|i| seed(&router, &format!("seed {}", i))).collect();

        let environment = SyncEnvironment::for_shell(shell);
        let main = open_slow(&router, &environment, SurfaceKind::Main, "mock:alice", Duration::from_millis(3)).await;
        let floating = open_slow(&router, &environment, SurfaceKind::Floating, "mock:alice", Duration::from_millis(11)).await;
        assert_eq!(main.todos().len(), 8);
        assert_eq!(floating.todos().len(), 8);

        let ids: Vec<_> = seeded.iter().map(|todo| todo.id).collect();
        let on_main = main.mutations().clone();
        let main_writes = tokio::spawn(async move {
            on_main.create(NewTodo::new("from main 1")).await.unwrap();
            on_main.update(ids[0], TodoPatch::text("seed 0 edited")).await.unwrap();
            tolerate_lost_race(on_main.reorder(ids[2], ids[3]).await);
            on_main.create(NewTodo::new("from main 2")).await.unwrap();
            on_main.toggle(ids[1]).await.unwrap();
            on_main.delete(ids[4]).await.unwrap();
        });

        let ids: Vec<_> = seeded.iter().map(|todo| todo.id).collect();
        let on_floating = floating.mutations().clone();
        let floating_writes = tokio::spawn(async move {
            tolerate_lost_race(on_floating.reorder(ids[7], ids[0]).await);
            on_floating.create(NewTodo::new("from floating")).await.unwrap();
            on_floating.delete(ids[6]).await.unwrap();
            on_floating.update(ids[5], TodoPatch::text("seed 5 edited")).await.unwrap();
            on_floating.toggle(ids[3]).await.unwrap();
        });

        main_writes.await.unwrap();
        floating_writes.await.unwrap();

        let fresh = open(&router, &environment, SurfaceKind::Main, "mock:alice").await;
        let expected = fresh.todos();
        assert_eq!(expected.len(), 9);
        assert!(expected.iter().all(|todo| !todo.id.is_pending()));

        for window in [&main, &floating] {
            let settled = window
                .wait_until(WAIT, |todos| todos == expected.as_slice())
                .await;
            assert!(settled, "{:?} window diverged from the store", window.kind());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_converge_on_web() {
        for _ in 0..3 {
            converge_under_concurrent_writes(ShellKind::Web).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_converge_on_desktop() {
        for _ in 0..3 {
            converge_under_concurrent_writes(ShellKind::Desktop).await;
        }
    }

    #[tokio::test]
    async fn test_reorder_reaches_the_other_window() {
        let (_router, _environment, w) = windows(ShellKind::Web).await;
        let a = w.main.mutations().create(NewTodo::new("A")).await.unwrap();
        let b = w.main.mutations().create(NewTodo::new("B")).await.unwrap();
        assert!(w.floating.wait_until(WAIT, |todos| todos.len() == 2).await);

        assert!(w.floating.mutations().reorder(a.id, b.id).await.unwrap());
        let moved = w
            .main
            .wait_until(WAIT, |todos| todos.iter().map(|t| t.id).collect::<Vec<_>>() == vec![a.id, b.id])
            .await;
        assert!(moved);
    }

    #[tokio::test]
    async fn test_other_owners_only_refetch() {
        let (router, environment, w) = windows(ShellKind::Web).await;
        let stranger = open(&router, &environment, SurfaceKind::Main, "mock:bob").await;

        w.main.mutations().create(NewTodo::new("private")).await.unwrap();
        assert!(w.floating.wait_until(WAIT, |todos| todos.len() == 1).await);

        stranger.refresh().await.unwrap();
        assert!(stranger.todos().is_empty());
    }

    #[tokio::test]
    async fn test_closed_window_stops_nothing() {
        let (_router, _environment, w) = windows(ShellKind::Desktop).await;
        let Windows { main, floating } = w;
        drop(floating);

        let todo = main.mutations().create(NewTodo::new("still works")).await.unwrap();
        assert_eq!(main.find(todo.id).unwrap().text, "still works");
    }
}
