use editor_mapper::{Mapper, ModelTree, UnbindOptions, ViewTree, ViewWriter};

const DEFER: UnbindOptions = UnbindOptions { defer: true };

#[test]
fn test_rerendered_element_keeps_new_binding() {
    let mut model = ModelTree::new();
    let mut view = ViewTree::new();
    let mut mapper = Mapper::new();

    let paragraph = model.create_element("paragraph");
    let root = view.create_root("div");
    let old_p = view.create_container("p");
    mapper.bind_elements(paragraph, old_p);
    view.append(root, old_p).unwrap();

    // Re-render: the old element leaves the tree, a new one takes its place.
    let new_p = view.create_container("p");
    {
        let mut writer = ViewWriter::new(&mut view, &mut mapper);
        writer.remove(old_p).unwrap();
        writer.unbind_view_element(old_p, DEFER);
        writer.bind_elements(paragraph, new_p);
        writer.insert(root, 0, new_p).unwrap();
    }

    // Nothing changes until the flush.
    assert_eq!(mapper.deferred_binding_count(), 1);
    assert_eq!(mapper.to_model_element(old_p), Some(paragraph));

    mapper.flush_deferred_bindings(&view);
    assert_eq!(mapper.deferred_binding_count(), 0);
    assert_eq!(mapper.to_model_element(old_p), None);
    assert_eq!(mapper.to_model_element(new_p), Some(paragraph));
    assert_eq!(mapper.to_view_element(paragraph), Some(new_p));
}

#[test]
fn test_reattached_element_stays_bound() {
    let mut model = ModelTree::new();
    let mut view = ViewTree::new();
    let mut mapper = Mapper::new();

    let paragraph = model.create_element("paragraph");
    let root = view.create_root("div");
    let other_root = view.create_root("div");
    let p = view.create_container("p");
    mapper.bind_elements(paragraph, p);
    view.append(root, p).unwrap();

    {
        let mut writer = ViewWriter::new(&mut view, &mut mapper);
        writer.remove(p).unwrap();
        writer.unbind_view_element(p, DEFER);
        // Moved rather than dropped.
        writer.append(other_root, p).unwrap();
    }

    mapper.flush_deferred_bindings(&view);
    assert_eq!(mapper.to_model_element(p), Some(paragraph));
    assert_eq!(mapper.to_view_element(paragraph), Some(p));
}

#[test]
fn test_destroyed_element_is_unbound() {
    let mut model = ModelTree::new();
    let mut view = ViewTree::new();
    let mut mapper = Mapper::new();

    let paragraph = model.create_element("paragraph");
    let root = view.create_root("div");
    let p = view.create_container("p");
    mapper.bind_elements(paragraph, p);
    view.append(root, p).unwrap();

    mapper.unbind_view_element(&view, p, DEFER);
    ViewWriter::new(&mut view, &mut mapper).destroy(p).unwrap();
    assert!(!view.contains(p));

    mapper.flush_deferred_bindings(&view);
    assert_eq!(mapper.to_model_element(p), None);
    assert_eq!(mapper.to_view_element(paragraph), None);
}

#[test]
fn test_element_left_in_place_is_unbound() {
    let mut model = ModelTree::new();
    let mut view = ViewTree::new();
    let mut mapper = Mapper::new();

    let paragraph = model.create_element("paragraph");
    let root = view.create_root("div");
    let p = view.create_container("p");
    mapper.bind_elements(paragraph, p);
    view.append(root, p).unwrap();

    mapper.unbind_view_element(&view, p, DEFER);
    mapper.flush_deferred_bindings(&view);
    assert_eq!(mapper.to_model_element(p), None);
}

#[test]
fn test_unbinding_is_a_benign_noop_when_repeated() {
    let mut model = ModelTree::new();
    let mut view = ViewTree::new();
    let mut mapper = Mapper::new();

    let paragraph = model.create_element("paragraph");
    let p = view.create_container("p");
    let stray = view.create_container("p");
    mapper.bind_elements(paragraph, p);

    mapper.unbind_view_element(&view, p, UnbindOptions::default());
    mapper.unbind_view_element(&view, p, UnbindOptions::default());
    mapper.unbind_view_element(&view, stray, UnbindOptions::default());
    mapper.unbind_model_element(&view, paragraph);
    mapper.flush_deferred_bindings(&view);

    assert!(mapper.bindings().is_empty());
}

#[test]
fn test_rebinding_a_model_element_keeps_the_new_reverse_entry() {
    let mut model = ModelTree::new();
    let mut view = ViewTree::new();
    let mut mapper = Mapper::new();

    let first = model.create_element("paragraph");
    let second = model.create_element("paragraph");
    let p = view.create_container("p");

    mapper.bind_elements(first, p);
    mapper.bind_elements(second, p);
    assert_eq!(mapper.to_model_element(p), Some(second));
    // The stale forward entry survives until it is unbound explicitly.
    assert_eq!(mapper.to_view_element(first), Some(p));

    // Unbinding the stale model element leaves the live reverse entry alone.
    mapper.unbind_model_element(&view, first);
    assert_eq!(mapper.to_view_element(first), None);
    assert_eq!(mapper.to_model_element(p), Some(second));

    mapper.clear_bindings();
    assert_eq!(mapper.to_view_element(second), None);
    assert_eq!(mapper.to_model_element(p), None);
}

#[test]
fn test_element_detached_after_deferral_is_unbound() {
    let mut model = ModelTree::new();
    let mut view = ViewTree::new();
    let mut mapper = Mapper::new();

    let paragraph = model.create_element("paragraph");
    let root = view.create_root("div");
    let p = view.create_container("p");
    mapper.bind_elements(paragraph, p);
    mapper.bind_element_to_marker(p, "comment:1");
    view.append(root, p).unwrap();

    mapper.unbind_view_element(&view, p, DEFER);
    assert_eq!(mapper.flush_unbound_marker_names(), vec!["comment:1".to_string()]);
    ViewWriter::new(&mut view, &mut mapper).remove(p).unwrap();

    mapper.flush_deferred_bindings(&view);
    assert_eq!(mapper.deferred_binding_count(), 0);
    assert_eq!(mapper.to_model_element(p), None);
    assert_eq!(mapper.to_view_element(paragraph), None);
    assert!(mapper.bindings().is_empty());
    // The names were reported when the unbinding was requested.
    assert!(mapper.flush_unbound_marker_names().is_empty());
}

#[test]
fn test_flush_separates_reattached_from_still_detached() {
    let mut model = ModelTree::new();
    let mut view = ViewTree::new();
    let mut mapper = Mapper::new();

    let first = model.create_element("paragraph");
    let second = model.create_element("paragraph");
    let root = view.create_root("div");
    let moved = view.create_container("p");
    let dropped = view.create_container("p");
    mapper.bind_elements(first, moved);
    mapper.bind_elements(second, dropped);
    mapper.bind_element_to_marker(dropped, "search:1");
    view.append(root, moved).unwrap();
    view.append(root, dropped).unwrap();

    // A detached fragment, not a root.
    let fragment = view.create_container("section");
    {
        let mut writer = ViewWriter::new(&mut view, &mut mapper);
        writer.remove(moved).unwrap();
        writer.unbind_view_element(moved, DEFER);
        writer.append(fragment, moved).unwrap();

        writer.remove(dropped).unwrap();
        writer.unbind_view_element(dropped, DEFER);
    }
    assert_eq!(mapper.flush_unbound_marker_names(), vec!["search:1".to_string()]);

    mapper.flush_deferred_bindings(&view);
    assert_eq!(mapper.to_model_element(moved), Some(first));
    assert_eq!(mapper.to_view_element(first), Some(moved));
    assert_eq!(mapper.to_model_element(dropped), None);
    assert_eq!(mapper.to_view_element(second), None);
    assert!(mapper.flush_unbound_marker_names().is_empty());
}
