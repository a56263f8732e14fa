use editor_mapper::{
    Mapper, MapperOptions, ModelNodeId, ModelPosition, ModelTree, ToViewOptions, UnbindOptions,
    ViewNodeId, ViewPosition, ViewTree, ViewWriter,
};
use pretty_assertions::assert_eq;

struct Doc {
    model: ModelTree,
    view: ViewTree,
    mapper: Mapper,
    root: ViewNodeId,
    paragraphs: Vec<(ModelNodeId, ViewNodeId)>,
}

impl Doc {
    /// One bound paragraph per entry; each view paragraph holds one text node per `char`.
    fn new(texts: &[&str], options: MapperOptions) -> Self {
        let mut model = ModelTree::new();
        let mut view = ViewTree::new();
        let mut mapper = Mapper::with_options(options);

        let model_root = model.create_element("$root");
        let root = view.create_root("div");
        mapper.bind_elements(model_root, root);

        let mut paragraphs = Vec::new();
        for text in texts {
            let paragraph = model.create_element("paragraph");
            model.append(model_root, paragraph).unwrap();
            let data = model.create_text(*text);
            model.append(paragraph, data).unwrap();

            let p = view.create_container("p");
            mapper.bind_elements(paragraph, p);
            view.append(root, p).unwrap();
            for ch in text.chars() {
                let node = view.create_text(ch.to_string());
                view.append(p, node).unwrap();
            }
            paragraphs.push((paragraph, p));
        }

        Self {
            model,
            view,
            mapper,
            root,
            paragraphs,
        }
    }

    fn to_view(&self, paragraph: usize, offset: usize) -> ViewPosition {
        self.mapper
            .to_view_position(
                &self.model,
                &self.view,
                ModelPosition::new(self.paragraphs[paragraph].0, offset),
                ToViewOptions::default(),
            )
            .unwrap()
    }

    fn anchor_offsets(&self, paragraph: usize) -> Vec<usize> {
        self.mapper
            .cached_anchors(self.paragraphs[paragraph].1)
            .unwrap_or_default()
            .iter()
            .map(|anchor| anchor.model_offset)
            .collect()
    }
}

#[test]
fn test_walk_caches_every_boundary() {
    let doc = Doc::new(&["abcde"], MapperOptions::default());
    doc.to_view(0, 5);
    assert_eq!(doc.anchor_offsets(0), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_text_change_drops_anchors_after_the_text_node() {
    let mut doc = Doc::new(&["abcdefghij"], MapperOptions::default());
    doc.to_view(0, 10);
    assert_eq!(doc.anchor_offsets(0).len(), 11);

    let (paragraph, p) = doc.paragraphs[0];
    let e = doc.view.child(p, 4).unwrap();
    ViewWriter::new(&mut doc.view, &mut doc.mapper)
        .insert_text(e, 1, "Z")
        .unwrap();
    let data = doc.model.children(paragraph)[0];
    doc.model.set_text(data, "abcdeZfghij").unwrap();

    assert_eq!(doc.anchor_offsets(0), vec![0, 1, 2, 3]);
    assert_eq!(doc.mapper.cache_stats().invalidated_anchors, 7);

    assert_eq!(doc.to_view(0, 6), ViewPosition::new(e, 2));
    let f = doc.view.child(p, 5).unwrap();
    assert_eq!(doc.to_view(0, 7), ViewPosition::new(f, 1));
}

#[test]
fn test_removal_drops_anchors_from_the_removed_node_on() {
    let mut doc = Doc::new(&["abcde"], MapperOptions::default());
    doc.to_view(0, 5);

    let (_, p) = doc.paragraphs[0];
    let c = doc.view.child(p, 2).unwrap();
    ViewWriter::new(&mut doc.view, &mut doc.mapper)
        .remove(c)
        .unwrap();

    // (p, 2) is the mutated point itself.
    assert_eq!(doc.anchor_offsets(0), vec![0, 1]);
}

#[test]
fn test_insertion_drops_anchor_at_the_insertion_point() {
    let mut doc = Doc::new(&["abcd"], MapperOptions::default());
    doc.to_view(0, 4);
    assert_eq!(doc.anchor_offsets(0), vec![0, 1, 2, 3, 4]);

    let (paragraph, p) = doc.paragraphs[0];
    let x = doc.view.create_text("X");
    ViewWriter::new(&mut doc.view, &mut doc.mapper)
        .insert(p, 2, x)
        .unwrap();
    let data = doc.model.children(paragraph)[0];
    doc.model.set_text(data, "abXcd").unwrap();

    let anchors = doc.mapper.cached_anchors(p).unwrap();
    assert!(anchors.iter().all(|anchor| anchor.view_position != ViewPosition::new(p, 2)));
    assert_eq!(doc.anchor_offsets(0), vec![0, 1]);

    assert_eq!(doc.to_view(0, 3), ViewPosition::new(x, 1));
    let c = doc.view.child(p, 3).unwrap();
    assert_eq!(doc.to_view(0, 4), ViewPosition::new(c, 1));
}

#[test]
fn test_changes_only_touch_their_own_container() {
    let mut doc = Doc::new(&["abc", "def"], MapperOptions::default());
    doc.to_view(0, 3);
    doc.to_view(1, 3);

    let (_, first) = doc.paragraphs[0];
    let x = doc.view.create_text("x");
    ViewWriter::new(&mut doc.view, &mut doc.mapper)
        .insert(first, 0, x)
        .unwrap();

    assert_eq!(doc.anchor_offsets(0), vec![0]);
    assert_eq!(doc.anchor_offsets(1), vec![0, 1, 2, 3]);

    // Inserting a paragraph into the root only affects the root's own coordinates.
    let extra = doc.view.create_container("p");
    let root = doc.root;
    ViewWriter::new(&mut doc.view, &mut doc.mapper)
        .insert(root, 0, extra)
        .unwrap();
    assert_eq!(doc.anchor_offsets(1), vec![0, 1, 2, 3]);
}

#[test]
fn test_changes_inside_formatting_route_to_the_container() {
    let mut doc = Doc::new(&["abc"], MapperOptions::default());
    let (paragraph, p) = doc.paragraphs[0];

    // Wrap "b" in <strong>: <p>a<strong>b</strong>c</p>.
    let b = doc.view.child(p, 1).unwrap();
    let strong = doc.view.create_attribute("strong");
    {
        let mut writer = ViewWriter::new(&mut doc.view, &mut doc.mapper);
        writer.remove(b).unwrap();
        writer.insert(p, 1, strong).unwrap();
        writer.append(strong, b).unwrap();
    }
    doc.to_view(0, 3);
    assert_eq!(doc.anchor_offsets(0), vec![0, 1, 2, 3]);

    // Typing inside <strong> invalidates everything after "b".
    ViewWriter::new(&mut doc.view, &mut doc.mapper)
        .insert_text(b, 1, "B")
        .unwrap();
    let data = doc.model.children(paragraph)[0];
    doc.model.set_text(data, "abBc").unwrap();
    assert_eq!(doc.anchor_offsets(0), vec![0, 1]);

    let c = doc.view.child(p, 2).unwrap();
    assert_eq!(doc.to_view(0, 2), ViewPosition::new(b, 1));
    assert_eq!(doc.to_view(0, 3), ViewPosition::new(c, 0));
    assert_eq!(doc.to_view(0, 4), ViewPosition::new(c, 1));
}

#[test]
fn test_moving_nodes_keeps_results_consistent() {
    let mut doc = Doc::new(&["abcd"], MapperOptions::default());
    let (paragraph, p) = doc.paragraphs[0];
    doc.to_view(0, 4);

    // Move "d" to the front: view "dabc".
    let d = doc.view.child(p, 3).unwrap();
    ViewWriter::new(&mut doc.view, &mut doc.mapper)
        .move_node(d, p, 0)
        .unwrap();
    let data = doc.model.children(paragraph)[0];
    doc.model.set_text(data, "dabc").unwrap();

    assert_eq!(doc.anchor_offsets(0), vec![0]);
    assert_eq!(doc.to_view(0, 1), ViewPosition::new(d, 1));
}

#[test]
fn test_unbinding_a_container_stops_tracking_it() {
    let mut doc = Doc::new(&["ab"], MapperOptions::default());
    let (paragraph, p) = doc.paragraphs[0];
    doc.to_view(0, 2);
    assert!(doc.mapper.is_tracking(p));

    doc.mapper
        .unbind_view_element(&doc.view, p, UnbindOptions::default());
    assert!(!doc.mapper.is_tracking(p));
    assert_eq!(doc.mapper.to_view_element(paragraph), None);
    assert_eq!(doc.mapper.to_model_element(p), None);
}

#[test]
fn test_unbinding_a_nested_element_invalidates_its_container() {
    let mut doc = Doc::new(&["ab"], MapperOptions::default());
    let (paragraph, p) = doc.paragraphs[0];

    // <paragraph>a<inline/>b</paragraph> rendered as <p>a<span/>b</p>.
    let data = doc.model.children(paragraph)[0];
    doc.model.set_text(data, "a").unwrap();
    let inline = doc.model.create_element("inline");
    doc.model.append(paragraph, inline).unwrap();
    let tail = doc.model.create_text("b");
    doc.model.append(paragraph, tail).unwrap();
    let span = doc.view.create_attribute("span");
    doc.mapper.bind_elements(inline, span);
    ViewWriter::new(&mut doc.view, &mut doc.mapper)
        .insert(p, 1, span)
        .unwrap();

    doc.to_view(0, 2);
    assert_eq!(doc.anchor_offsets(0), vec![0, 1, 2]);

    doc.mapper
        .unbind_view_element(&doc.view, span, UnbindOptions::default());
    assert_eq!(doc.anchor_offsets(0), vec![0]);
}

#[test]
fn test_disabled_cache_keeps_no_anchors() {
    let doc = Doc::new(
        &["abc"],
        MapperOptions {
            cache_enabled: false,
        },
    );
    let (_, p) = doc.paragraphs[0];
    doc.to_view(0, 3);
    doc.to_view(0, 3);

    assert!(!doc.mapper.is_tracking(p));
    let stats = doc.mapper.cache_stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.measured_nodes, 6);
}

#[test]
fn test_set_cache_enabled_drops_anchors() {
    let mut doc = Doc::new(&["abc"], MapperOptions::default());
    let (_, p) = doc.paragraphs[0];
    doc.to_view(0, 3);
    assert!(doc.mapper.is_tracking(p));

    doc.mapper.set_cache_enabled(false);
    assert!(!doc.mapper.options().cache_enabled);
    assert!(!doc.mapper.is_tracking(p));
}

#[test]
fn test_length_callback_bypasses_cache() {
    let mut doc = Doc::new(&["abc"], MapperOptions::default());
    let (_, p) = doc.paragraphs[0];
    doc.to_view(0, 3);
    assert!(doc.mapper.is_tracking(p));

    doc.mapper.register_view_to_model_length("mention", |_, _| 1);
    assert!(!doc.mapper.is_tracking(p));

    let c = doc.view.child(p, 2).unwrap();
    assert_eq!(doc.to_view(0, 3), ViewPosition::new(c, 1));
    assert!(!doc.mapper.is_tracking(p));
}
