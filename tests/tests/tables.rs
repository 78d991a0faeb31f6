use pipelined::{MAX_TABLE_NUM, TableAllocator, TableError};

const APPS: &[&str] = &["access_control", "check_quota", "enforcement", "egress"];

#[test]
fn main_tables_follow_pipeline_order() {
    let alloc = TableAllocator::new(APPS).unwrap();
    assert_eq!(alloc.get_table_num("access_control"), Ok(0));
    assert_eq!(alloc.get_table_num("check_quota"), Ok(1));
    assert_eq!(alloc.get_table_num("enforcement"), Ok(2));
    assert_eq!(alloc.get_table_num("egress"), Ok(3));

    assert_eq!(alloc.get_next_table_num("access_control"), Ok(1));
    assert_eq!(alloc.get_next_table_num("enforcement"), Ok(3));
}

#[test]
fn assignment_is_deterministic() {
    let a = TableAllocator::new(APPS).unwrap();
    let b = TableAllocator::new(APPS).unwrap();
    for app in APPS {
        assert_eq!(a.get_table_num(app), b.get_table_num(app));
    }
}

#[test]
fn last_app_has_no_next_table() {
    let alloc = TableAllocator::new(APPS).unwrap();
    assert_eq!(
        alloc.get_next_table_num("egress"),
        Err(TableError::NoNextTable("egress".to_string()))
    );
}

#[test]
fn unknown_app_is_rejected() {
    let mut alloc = TableAllocator::new(APPS).unwrap();
    assert_eq!(
        alloc.get_table_num("conntrack"),
        Err(TableError::UnknownApp("conntrack".to_string()))
    );
    assert_eq!(
        alloc.get_next_table_num("conntrack"),
        Err(TableError::UnknownApp("conntrack".to_string()))
    );
    assert_eq!(
        alloc.allocate_scratch_tables("conntrack", 1),
        Err(TableError::UnknownApp("conntrack".to_string()))
    );
}

#[test]
fn duplicate_registration_is_rejected() {
    let err = TableAllocator::new(&["egress", "egress"]).unwrap_err();
    assert_eq!(err, TableError::DuplicateApp("egress".to_string()));
}

#[test]
fn scratch_tables_are_disjoint_from_every_main_table() {
    let mut alloc = TableAllocator::new(APPS).unwrap();
    let quota = alloc.allocate_scratch_tables("check_quota", 2).unwrap();
    let enforcement = alloc.allocate_scratch_tables("enforcement", 1).unwrap();

    // Mains occupy 0..=3, so scratch numbers continue from 4 and never
    // collide with a main table or with each other.
    assert_eq!(quota, vec![4, 5]);
    assert_eq!(enforcement, vec![6]);

    let assignment = alloc.assignment("check_quota").unwrap();
    assert_eq!(assignment.main_table, 1);
    assert_eq!(assignment.scratch_tables, vec![4, 5]);
}

#[test]
fn numbering_space_is_bounded() {
    let mut alloc = TableAllocator::new(APPS).unwrap();
    // 4 mains leave (MAX_TABLE_NUM + 1) - 4 numbers for scratch use.
    let available = MAX_TABLE_NUM as usize + 1 - APPS.len();
    let tables = alloc
        .allocate_scratch_tables("enforcement", available)
        .unwrap();
    assert_eq!(*tables.last().unwrap(), MAX_TABLE_NUM);

    assert_eq!(
        alloc.allocate_scratch_tables("enforcement", 1),
        Err(TableError::ExhaustedTableSpace)
    );
    // A zero-sized request still succeeds on a full allocator.
    assert_eq!(alloc.allocate_scratch_tables("enforcement", 0), Ok(vec![]));
}

#[test]
fn oversized_scratch_request_is_rejected() {
    let mut alloc = TableAllocator::new(APPS).unwrap();
    // Requests beyond the whole numbering space must be rejected
    // outright, including ones that would overflow narrow arithmetic.
    for count in [256, 65535, 65536, usize::MAX] {
        assert_eq!(
            alloc.allocate_scratch_tables("enforcement", count),
            Err(TableError::ExhaustedTableSpace)
        );
    }
    // Rejected requests leave the allocator untouched.
    let assignment = alloc.assignment("enforcement").unwrap();
    assert!(assignment.scratch_tables.is_empty());
    assert_eq!(alloc.allocate_scratch_tables("enforcement", 1), Ok(vec![4]));
}
