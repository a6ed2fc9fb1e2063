#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use test_context::{test_context, TestContext};
    use todosync::api::procedures::{ListOutput, Procedure};
    use todosync::db::db::Db;
    use todosync::libs::error::RpcError;
    use todosync::libs::todo::{Category, Todo, TodoId};
    use todosync::server::auth::{sign_token, Authenticator};
    use todosync::server::handlers::TodoRouter;

    const ALICE: Option<&str> = Some("mock:alice");
    const BOB: Option<&str> = Some("mock:bob");

    struct RouterTestContext {
        router: TodoRouter,
    }

    impl TestContext for RouterTestContext {
        fn setup() -> Self {
            RouterTestContext {
                router: TodoRouter::new(Db::in_memory().unwrap(), Authenticator::mock()),
            }
        }
    }

    impl RouterTestContext {
        fn call(&self, who: Option<&str>, procedure: Procedure, input: Value) -> Result<Value, RpcError> {
            self.router.dispatch(who, procedure, input)
        }

        fn create(&self, who: Option<&str>, text: &str) -> Todo {
            let value = self.call(who, Procedure::TodoCreate, json!({ "text": text })).unwrap();
            serde_json::from_value(value).unwrap()
        }

        fn list(&self, who: Option<&str>, input: Value) -> ListOutput {
            serde_json::from_value(self.call(who, Procedure::TodoList, input).unwrap()).unwrap()
        }
    }

    #[test_context(RouterTestContext)]
    #[test]
    fn test_create_and_list(ctx: &mut RouterTestContext) {
        ctx.create(ALICE, "one");
        let two = ctx.create(ALICE, "two");
        assert!(matches!(two.id, TodoId::Persisted(id) if id > 0));

        let output = ctx.list(ALICE, Value::Null);
        assert_eq!(output.total, 2);
        assert!(!output.has_more);
        assert_eq!(output.next_offset, None);
        assert_eq!(output.todos[0].text, "two");
    }

    #[test_context(RouterTestContext)]
    #[test]
    fn test_owners_never_see_each_other(ctx: &mut RouterTestContext) {
        let secret = ctx.create(ALICE, "alice only");
        let id = secret.id.to_wire();

        assert_eq!(ctx.list(BOB, json!({})).total, 0);
        for (procedure, input) in [
            (Procedure::TodoUpdate, json!({ "id": id, "data": { "text": "mine now" } })),
            (Procedure::TodoToggle, json!({ "id": id })),
            (Procedure::TodoDelete, json!({ "id": id })),
            (Procedure::TodoReorder, json!({ "items": [{ "id": id, "order": 3 }] })),
        ] {
            let err = ctx.call(BOB, procedure, input).unwrap_err();
            assert!(err.is_not_found(), "{} should look missing, got {:?}", procedure, err);
        }

        let output = ctx.list(ALICE, json!({}));
        assert_eq!(output.todos, vec![secret]);
    }

    #[test_context(RouterTestContext)]
    #[test]
    fn test_default_mock_user(ctx: &mut RouterTestContext) {
        ctx.create(None, "anonymous");
        assert_eq!(ctx.list(Some("mock:mock-user"), json!({})).total, 1);
        assert_eq!(ctx.list(ALICE, json!({})).total, 0);
    }

    #[test_context(RouterTestContext)]
    #[test]
    fn test_pending_ids_never_reach_the_store(ctx: &mut RouterTestContext) {
        let kept = ctx.create(ALICE, "kept");

        assert_eq!(
            ctx.call(ALICE, Procedure::TodoUpdate, json!({ "id": -1001, "data": { "text": "x" } })).unwrap(),
            Value::Null
        );
        assert_eq!(ctx.call(ALICE, Procedure::TodoToggle, json!({ "id": -1001 })).unwrap(), Value::Null);
        assert_eq!(
            ctx.call(ALICE, Procedure::TodoDelete, json!({ "id": -1001 })).unwrap(),
            json!({ "success": true })
        );

        let reorder = json!({ "items": [{ "id": -1001, "order": 0 }, { "id": kept.id.to_wire(), "order": 4 }] });
        assert_eq!(ctx.call(ALICE, Procedure::TodoReorder, reorder).unwrap(), json!({ "success": true }));

        let output = ctx.list(ALICE, json!({}));
        assert_eq!(output.total, 1);
        assert_eq!(output.todos[0].order, 4);
    }

    #[test_context(RouterTestContext)]
    #[test]
    fn test_reorder_rejects_the_whole_batch(ctx: &mut RouterTestContext) {
        let a = ctx.create(ALICE, "a");
        let foreign = ctx.create(BOB, "b");

        let input = json!({ "items": [{ "id": a.id.to_wire(), "order": 9 }, { "id": foreign.id.to_wire(), "order": 0 }] });
        assert!(ctx.call(ALICE, Procedure::TodoReorder, input).unwrap_err().is_not_found());
        assert_eq!(ctx.list(ALICE, json!({})).todos[0].order, 0);
    }

    #[test_context(RouterTestContext)]
    #[test]
    fn test_delete_missing_is_not_found(ctx: &mut RouterTestContext) {
        let todo = ctx.create(ALICE, "once");
        let input = json!({ "id": todo.id.to_wire() });
        assert_eq!(ctx.call(ALICE, Procedure::TodoDelete, input.clone()).unwrap(), json!({ "success": true }));
        assert!(ctx.call(ALICE, Procedure::TodoDelete, input).unwrap_err().is_not_found());
    }

    #[test_context(RouterTestContext)]
    #[test]
    fn test_clear_completed_counts(ctx: &mut RouterTestContext) {
        let a = ctx.create(ALICE, "a");
        ctx.create(ALICE, "b");
        ctx.call(ALICE, Procedure::TodoToggle, json!({ "id": a.id.to_wire() })).unwrap();

        let output = ctx.call(ALICE, Procedure::TodoClearCompleted, Value::Null).unwrap();
        assert_eq!(output, json!({ "deletedCount": 1 }));
        assert_eq!(ctx.list(ALICE, json!({})).total, 1);
    }

    #[test_context(RouterTestContext)]
    #[test]
    fn test_list_paging(ctx: &mut RouterTestContext) {
        for i in 0..5 {
            ctx.create(ALICE, &format!("t{}", i));
        }

        let first = ctx.list(ALICE, json!({ "limit": 2 }));
        assert!(first.has_more);
        assert_eq!(first.next_offset, Some(2));
        let last = ctx.list(ALICE, json!({ "limit": 2, "offset": 4 }));
        assert!(!last.has_more);
        assert_eq!(last.todos.len(), 1);

        let done = ctx.list(ALICE, json!({ "completed": true }));
        assert_eq!(done.total, 0);
    }

    #[test_context(RouterTestContext)]
    #[test]
    fn test_invalid_input(ctx: &mut RouterTestContext) {
        let bad = |procedure, input| matches!(ctx.call(ALICE, procedure, input), Err(RpcError::BadRequest(_)));

        assert!(bad(Procedure::TodoList, json!({ "limit": 0 })));
        assert!(bad(Procedure::TodoList, json!({ "limit": 101 })));
        assert!(bad(Procedure::TodoCreate, json!({ "text": "   " })));
        assert!(bad(Procedure::TodoCreate, json!({ "text": "x".repeat(501) })));
        assert!(bad(Procedure::TodoCreate, json!({ "text": "ok", "notes": "n".repeat(2001) })));
        assert!(bad(Procedure::TodoCreate, json!({ "nope": true })));
        assert!(bad(Procedure::CategoryCreate, json!({ "name": "c".repeat(51) })));
        assert!(bad(Procedure::CategoryCreate, json!({ "name": "Work", "color": "mauve" })));
    }

    #[test_context(RouterTestContext)]
    #[test]
    fn test_categories(ctx: &mut RouterTestContext) {
        let value = ctx.call(ALICE, Procedure::CategoryCreate, json!({ "name": "Work", "color": "green" })).unwrap();
        let work: Category = serde_json::from_value(value).unwrap();

        let conflict = ctx.call(ALICE, Procedure::CategoryCreate, json!({ "name": "Work" })).unwrap_err();
        assert!(matches!(conflict, RpcError::Conflict(_)));

        let todo = ctx.call(ALICE, Procedure::TodoCreate, json!({ "text": "report", "categoryId": work.id })).unwrap();
        assert_eq!(todo["categoryId"], json!(work.id));
        assert!(ctx
            .call(BOB, Procedure::TodoCreate, json!({ "text": "report", "categoryId": work.id }))
            .unwrap_err()
            .is_not_found());

        let renamed = ctx
            .call(ALICE, Procedure::CategoryUpdate, json!({ "id": work.id, "data": { "name": "Office" } }))
            .unwrap();
        assert_eq!(renamed["name"], json!("Office"));
        assert!(ctx
            .call(BOB, Procedure::CategoryDelete, json!({ "id": work.id }))
            .unwrap_err()
            .is_not_found());

        ctx.call(ALICE, Procedure::CategoryDelete, json!({ "id": work.id })).unwrap();
        assert_eq!(ctx.call(ALICE, Procedure::CategoryList, Value::Null).unwrap(), json!([]));
        assert_eq!(ctx.list(ALICE, json!({})).todos[0].category_id, None);
    }

    #[test]
    fn test_jwt_mode_requires_a_valid_token() {
        let router = TodoRouter::new(Db::in_memory().unwrap(), Authenticator::jwt("s3cret"));
        let token = sign_token("s3cret", "alice", None, chrono::Duration::hours(1)).unwrap();
        let forged = sign_token("other", "alice", None, chrono::Duration::hours(1)).unwrap();

        assert!(router.dispatch(None, Procedure::TodoList, Value::Null).unwrap_err().is_unauthorized());
        assert!(router.dispatch(Some("mock:alice"), Procedure::TodoList, Value::Null).unwrap_err().is_unauthorized());
        assert!(router.dispatch(Some(forged.as_str()), Procedure::TodoList, Value::Null).unwrap_err().is_unauthorized());
        assert!(router.dispatch(Some(token.as_str()), Procedure::TodoList, Value::Null).is_ok());
    }
}
