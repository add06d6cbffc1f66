//! Stress test: long implication chains and wide fan-out.

use gigvora_access::matrix::{Membership, Permission, PermissionMatrix};
use gigvora_access::registry::{LoadMode, PermissionRegistry};
use gigvora_access::resolve::{resolve_for, PermissionSource};

/// `step:0 → step:1 → … → step:{depth-1}`
fn chain_matrix(depth: usize) -> PermissionMatrix {
    let mut matrix = PermissionMatrix::new();
    for i in 0..depth {
        let mut permission = Permission::new(format!("step:{i}")).in_category("chain");
        if i + 1 < depth {
            permission = permission.implying(format!("step:{}", i + 1));
        }
        matrix.permissions.push(permission);
    }
    matrix
        .memberships
        .push(Membership::new("root_holder").granting("step:0"));
    matrix
        .memberships
        .push(Membership::new("midway_holder").granting(format!("step:{}", depth / 2)));
    matrix
}

#[test]
fn stress_implication_chain_depth_1000() {
    let depth = 1000;
    let registry = PermissionRegistry::build(chain_matrix(depth), LoadMode::Strict)
        .expect("chain matrix should build");

    let state = resolve_for(&registry, &["root_holder"], &[]);
    assert_eq!(state.permissions.len(), depth);
    assert!(state.has_permission(&format!("step:{}", depth - 1)));

    // Memoized closure agrees with resolution.
    assert_eq!(registry.implied_by("step:0").unwrap().len(), depth - 1);
    assert!(registry.implies("step:0", &format!("step:{}", depth - 1)));
    assert!(!registry.implies(&format!("step:{}", depth - 1), "step:0"));
}

#[test]
fn stress_chain_attribution_splits_at_midpoint() {
    let depth = 400;
    let registry = PermissionRegistry::build(chain_matrix(depth), LoadMode::Strict).unwrap();
    let state = resolve_for(&registry, &["root_holder", "midway_holder"], &[]);

    let root = PermissionSource::membership("root_holder");
    let midway = PermissionSource::membership("midway_holder");

    for i in 0..depth {
        let sources = state.sources_for(&format!("step:{i}")).unwrap();
        assert!(sources.contains(&root));
        assert_eq!(sources.contains(&midway), i >= depth / 2, "step:{i}");
    }
}

#[test]
fn stress_wide_fan_out_500() {
    let width = 500;
    let mut matrix = PermissionMatrix::new();
    let mut hub = Permission::new("hub:all");
    for i in 0..width {
        hub = hub.implying(format!("leaf:{i}"));
        matrix.permissions.push(Permission::new(format!("leaf:{i}")));
    }
    matrix.permissions.push(hub);
    matrix
        .memberships
        .push(Membership::new("hub_holder").granting("hub:all"));

    let registry = PermissionRegistry::build(matrix, LoadMode::Strict).unwrap();
    let state = resolve_for(&registry, &["hub_holder"], &[]);
    assert_eq!(state.permissions.len(), width + 1);
    assert_eq!(state.permissions_matching("leaf:*").len(), width);
}

#[test]
fn stress_dense_cycle_terminates() {
    // Every permission implies every other one.
    let size = 60;
    let mut matrix = PermissionMatrix::new();
    for i in 0..size {
        let mut permission = Permission::new(format!("mesh:{i}"));
        for j in 0..size {
            if i != j {
                permission = permission.implying(format!("mesh:{j}"));
            }
        }
        matrix.permissions.push(permission);
    }
    for i in 0..5 {
        matrix
            .memberships
            .push(Membership::new(format!("member_{i}")).granting(format!("mesh:{i}")));
    }

    let registry = PermissionRegistry::build(matrix, LoadMode::Strict).unwrap();
    let members: Vec<String> = (0..5).map(|i| format!("member_{i}")).collect();
    let member_refs: Vec<&str> = members.iter().map(String::as_str).collect();
    let state = resolve_for(&registry, &member_refs, &[]);

    assert_eq!(state.permissions.len(), size);
    for i in 0..size {
        assert_eq!(state.sources_for(&format!("mesh:{i}")).unwrap().len(), 5);
    }
}
