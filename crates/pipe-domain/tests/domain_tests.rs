use pipe_domain::{Dependency, EntityId, Filetype, Table};

fn ft(id: i64, name: &str, parent: Option<i64>) -> Filetype {
    Filetype { id: EntityId::Persisted(id),
               name: name.to_string(),
               extension: name.to_lowercase(),
               parent_file_type_id: parent.map(EntityId::Persisted) }
}

#[test]
fn test_subtype_acceptance_is_transitive() {
    // A -> B -> C (el padre de A es B, el de B es C)
    let (a, b, c) = (EntityId::Persisted(1), EntityId::Persisted(2), EntityId::Persisted(3));
    let types: Table<Filetype> = vec![ft(1, "A", Some(2)), ft(2, "B", Some(3)), ft(3, "C", None)].into_iter().collect();

    assert!(types.accepts(c, a));
    assert!(types.accepts(c, b));
    assert!(types.accepts(c, c));

    assert!(types.accepts(a, a));
    assert!(!types.accepts(a, b));
    assert!(!types.accepts(a, c));
}

#[test]
fn test_filtered_queries_preserve_insertion_order() {
    let p = |n: i64| EntityId::Persisted(n);
    let deps: Table<Dependency> = vec![Dependency::new(p(5), p(1)),
                                       Dependency::new(p(6), p(1)),
                                       Dependency::new(p(5), p(2)),
                                       Dependency::new(p(5), p(3))].into_iter()
                                                                   .collect();
    let parents: Vec<EntityId> = deps.for_process(p(5)).iter().map(|d| d.parent_process_id).collect();
    assert_eq!(parents, vec![p(1), p(2), p(3)]);
    let children: Vec<EntityId> = deps.with_parent(p(1)).iter().map(|d| d.process_id).collect();
    assert_eq!(children, vec![p(5), p(6)]);
}

#[test]
fn test_union_never_subtracts() {
    let mut left: Table<Filetype> = vec![ft(1, "BAM", None)].into_iter().collect();
    let right: Table<Filetype> = vec![ft(1, "OTHER", None), ft(2, "SAM", None)].into_iter().collect();
    assert_eq!(left.union(&right), 1);
    assert_eq!(left.len(), 2);
    assert_eq!(left.get(&EntityId::Persisted(1)).map(|f| f.name.as_str()), Some("BAM"));
}
