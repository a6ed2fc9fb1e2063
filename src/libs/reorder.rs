//! Drag-and-drop reordering of the pending list.
//!
//! A drop is a single-element move inside the pending sequence followed by a
//! renumbering of the whole sequence to `0..n`. The resulting batch is both
//! applied to the local cache and persisted in one request.

use crate::libs::todo::{ReorderItem, Todo, TodoId};

/// Moves the element at `from` so that it ends up at `to`.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from == to || from >= items.len() || to >= items.len() {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Computes the new contiguous order after dropping `active` onto `over`.
///
/// `pending` must already be in display order. Returns `None` when either id
/// is absent or when the item is dropped onto itself.
pub fn plan_reorder(pending: &[Todo], active: TodoId, over: TodoId) -> Option<Vec<ReorderItem>> {
    if active == over {
        return None;
    }
    let from = pending.iter().position(|todo| todo.id == active)?;
    let to = pending.iter().position(|todo| todo.id == over)?;

    let mut ids: Vec<TodoId> = pending.iter().map(|todo| todo.id).collect();
    array_move(&mut ids, from, to);

    Some(
        ids.into_iter()
            .enumerate()
            .map(|(index, id)| ReorderItem { id, order: index as i64 })
            .collect(),
    )
}

/// Writes a planned batch into cached tasks.
pub fn apply_plan(todos: &mut [Todo], plan: &[ReorderItem]) {
    for item in plan {
        if let Some(todo) = todos.iter_mut().find(|todo| todo.id == item.id) {
            todo.order = item.order;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::todo::{sort_for_display, NewTodo};

    fn task(id: i64, order: i64) -> Todo {
        let mut todo = Todo::placeholder(TodoId::Persisted(id), &NewTodo::new(format!("task {}", id)));
        todo.order = order;
        todo
    }

    #[test]
    fn dragging_a_onto_b_swaps_them() {
        let pending = vec![task(1, 0), task(2, 1)];
        let plan = plan_reorder(&pending, TodoId::Persisted(1), TodoId::Persisted(2)).unwrap();
        assert_eq!(
            plan,
            vec![
                ReorderItem { id: TodoId::Persisted(2), order: 0 },
                ReorderItem { id: TodoId::Persisted(1), order: 1 },
            ]
        );
    }

    #[test]
    fn dropping_onto_itself_is_a_no_op() {
        let pending = vec![task(1, 0), task(2, 1)];
        assert!(plan_reorder(&pending, TodoId::Persisted(2), TodoId::Persisted(2)).is_none());
    }

    #[test]
    fn unknown_ids_are_a_no_op() {
        let pending = vec![task(1, 0), task(2, 1)];
        assert!(plan_reorder(&pending, TodoId::Persisted(9), TodoId::Persisted(2)).is_none());
        assert!(plan_reorder(&pending, TodoId::Persisted(1), TodoId::Pending(4)).is_none());
    }

    #[test]
    fn moving_up_renumbers_contiguously() {
        let pending = vec![task(1, 0), task(2, 3), task(3, 7), task(4, 9)];
        let plan = plan_reorder(&pending, TodoId::Persisted(4), TodoId::Persisted(2)).unwrap();
        let ids: Vec<i64> = plan.iter().map(|item| item.id.to_wire()).collect();
        let orders: Vec<i64> = plan.iter().map(|item| item.order).collect();
        assert_eq!(ids, vec![1, 4, 2, 3]);
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[test]
    fn applying_twice_changes_nothing_more() {
        let mut todos = vec![task(1, 0), task(2, 1), task(3, 2)];
        let plan = plan_reorder(&todos, TodoId::Persisted(3), TodoId::Persisted(1)).unwrap();
        apply_plan(&mut todos, &plan);
        sort_for_display(&mut todos);
        let once: Vec<(i64, i64)> = todos.iter().map(|t| (t.id.to_wire(), t.order)).collect();

        apply_plan(&mut todos, &plan);
        sort_for_display(&mut todos);
        let twice: Vec<(i64, i64)> = todos.iter().map(|t| (t.id.to_wire(), t.order)).collect();

        assert_eq!(once, vec![(3, 0), (1, 1), (2, 2)]);
        assert_eq!(once, twice);
    }

    #[test]
    fn array_move_ignores_out_of_range() {
        let mut items = vec!['a', 'b', 'c'];
        array_move(&mut items, 0, 5);
        assert_eq!(items, vec!['a', 'b', 'c']);
        array_move(&mut items, 2, 0);
        assert_eq!(items, vec!['c', 'a', 'b']);
    }
}
