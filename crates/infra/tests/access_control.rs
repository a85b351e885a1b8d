use std::sync::Arc;

use tokio::sync::mpsc;

use posgate_auth::{
    AuthGuard, AuthState, Branch, BranchRow, BusinessTypeGuard, BusinessTypeId, DenialKind,
    GuardOutcome, GuardStack, Navigation, NavigationState, Role, RoleCatalogEntry, RoleGuard,
};
use posgate_core::{BranchId, BusinessId, UserId};
use posgate_infra::{
    AccessConfig, InMemoryPlatform, InMemorySessionStore, PlatformFailures,
    in_memory_access_control,
};
use posgate_session::{
    BusinessRow, BusinessTypeSource, IdentityResolver, ProfileRow, RoleAssignmentRow,
    ScopeProvider, Session, SessionError, SessionRecord, SessionStore,
};

type Resolver =
    IdentityResolver<Arc<InMemoryPlatform>, Arc<InMemoryPlatform>, Arc<InMemorySessionStore>>;

fn business_id() -> BusinessId {
    BusinessId::new("biz-1")
}

fn branch_row(id: &str, is_active: Option<bool>) -> BranchRow {
    BranchRow {
        id: BranchId::new(id),
        business_id: Some(business_id()),
        name: format!("Branch {id}"),
        address: None,
        phone: None,
        is_active,
    }
}

fn profile(user_id: &str, email: &str, role: Role, branch: &str) -> ProfileRow {
    ProfileRow {
        user_id: UserId::new(user_id),
        email: email.to_string(),
        branch_id: Some(BranchId::new(branch)),
        business_id: Some(business_id()),
        role: Some(role),
    }
}

fn session(user_id: &str, email: &str) -> Session {
    Session {
        user_id: UserId::new(user_id),
        email: email.to_string(),
    }
}

/// A hotel business with three branches (B2 inactive) and a few staff.
fn seeded_platform() -> Arc<InMemoryPlatform> {
    posgate_observability::init();
    let platform = Arc::new(InMemoryPlatform::new());
    platform.insert_business(BusinessRow {
        id: business_id(),
        name: "Sunrise Hotels".to_string(),
        business_type: Some(BusinessTypeId::new("hotel")),
    });
    platform.insert_branch(branch_row("B1", None));
    platform.insert_branch(branch_row("B2", Some(false)));
    platform.insert_branch(branch_row("B3", Some(true)));

    platform.insert_profile(profile("u-emp", "emp@restaurant-mail.com", Role::EMPLOYEE, "B1"));
    platform.insert_profile(profile("u-boss", "boss@example.com", Role::SUPER_MANAGER, "B1"));
    platform.insert_profile(profile("u-cash", "cash@example.com", Role::CASHIER, "B3"));
    platform.insert_role_assignment(RoleAssignmentRow {
        user_id: UserId::new("u-cash"),
        role: Role::SUPERVISOR,
        branch_id: Some(BranchId::new("B3")),
        is_active: true,
    });
    platform.insert_role_assignment(RoleAssignmentRow {
        user_id: UserId::new("u-cash"),
        role: Role::MANAGER,
        branch_id: None,
        is_active: false,
    });
    platform
}

fn resolver(platform: &Arc<InMemoryPlatform>, store: Arc<InMemorySessionStore>) -> Arc<Resolver> {
    Arc::new(IdentityResolver::new(platform.clone(), platform.clone(), store))
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity resolution
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_change_loads_profile_roles_and_scope() {
    let platform = seeded_platform();
    let access = in_memory_access_control(&AccessConfig::default(), platform.clone());

    access.on_session_change(Some(session("u-cash", "cash@example.com"))).await;

    let snapshot = access.snapshot();
    assert_eq!(snapshot.auth_state, AuthState::Authenticated);
    assert_eq!(snapshot.identity.primary_role, Some(Role::CASHIER));
    // Only the active assignment is loaded.
    assert_eq!(snapshot.identity.secondary_roles.len(), 1);
    assert!(access.resolver().has_role(&Role::SUPERVISOR, Some(&BranchId::new("B3"))));
    assert!(!access.resolver().has_role(&Role::SUPERVISOR, Some(&BranchId::new("B1"))));
    assert!(!access.resolver().has_role(&Role::MANAGER, None));

    assert_eq!(
        snapshot.business_type.as_ref().map(|bt| bt.id.as_str()),
        Some("hotel")
    );
    assert_eq!(access.scope().branches().len(), 3);
    assert_eq!(
        snapshot.selected_branch.map(|b| b.id),
        Some(BranchId::new("B3")),
        "home branch is selected when nothing was persisted"
    );
    assert_eq!(access.scope().term("branch"), "property");
}

#[tokio::test]
async fn email_guess_is_replaced_once_profile_loads() {
    let platform = seeded_platform();
    let resolver = resolver(&platform, Arc::new(InMemorySessionStore::new()));
    let gate = platform.hold_profile_fetches();

    let task = {
        let resolver = resolver.clone();
        tokio::spawn(async move {
            resolver
                .resolve_from_session(Some(session("u-emp", "emp@restaurant-mail.com")))
                .await;
        })
    };
    platform.profile_fetch_started().await;

    let pending = resolver.snapshot();
    assert_eq!(pending.auth_state, AuthState::Authenticating);
    assert!(pending.is_authenticated());
    assert_eq!(pending.business_type_id, Some(BusinessTypeId::new("restaurant")));
    assert_eq!(pending.business_type_source, BusinessTypeSource::EmailGuess);

    gate.notify_one();
    task.await.unwrap();

    let loaded = resolver.snapshot();
    assert_eq!(loaded.auth_state, AuthState::Authenticated);
    assert_eq!(loaded.business_type_id, Some(BusinessTypeId::new("hotel")));
    assert_eq!(loaded.business_type_source, BusinessTypeSource::Profile);
}

#[tokio::test]
async fn profile_fetch_after_logout_is_discarded() {
    let platform = seeded_platform();
    let resolver = resolver(&platform, Arc::new(InMemorySessionStore::new()));
    let gate = platform.hold_profile_fetches();

    let task = {
        let resolver = resolver.clone();
        tokio::spawn(async move {
            resolver
                .resolve_from_session(Some(session("u-boss", "boss@example.com")))
                .await;
        })
    };
    platform.profile_fetch_started().await;

    resolver.logout().await;
    gate.notify_one();
    task.await.unwrap();

    let snapshot = resolver.snapshot();
    assert_eq!(snapshot.auth_state, AuthState::Unauthenticated);
    assert!(snapshot.identity.is_cleared());
    assert!(!resolver.has_role(&Role::SUPER_MANAGER, None));
}

#[tokio::test]
async fn failed_profile_fetch_stays_pending() {
    let platform = seeded_platform();
    platform.set_failures(PlatformFailures {
        profiles: true,
        ..Default::default()
    });
    let access = in_memory_access_control(&AccessConfig::default(), platform.clone());

    access.on_session_change(Some(session("u-emp", "emp@example.com"))).await;

    let snapshot = access.snapshot();
    assert_eq!(snapshot.auth_state, AuthState::Authenticating);
    assert_eq!(snapshot.identity.email.as_deref(), Some("emp@example.com"));
    assert_eq!(snapshot.identity.primary_role, None);

    let guard = RoleGuard::new([Role::MANAGER]);
    assert_eq!(snapshot.check(&guard, "/"), GuardOutcome::Pending);
    assert_eq!(snapshot.check(&AuthGuard, "/orders"), GuardOutcome::Render);
}

#[tokio::test]
async fn session_provider_failure_keeps_prior_state() {
    let platform = seeded_platform();
    let resolver = resolver(&platform, Arc::new(InMemorySessionStore::new()));
    resolver
        .resolve_from_session(Some(session("u-emp", "emp@example.com")))
        .await;
    let before = resolver.snapshot();

    platform.set_failures(PlatformFailures {
        current_session: true,
        ..Default::default()
    });
    resolver.restore().await;

    assert_eq!(resolver.snapshot(), before);
}

#[tokio::test]
async fn null_session_restores_from_record() {
    let platform = seeded_platform();
    let store = Arc::new(InMemorySessionStore::with_record(SessionRecord {
        business_type_id: Some(BusinessTypeId::new("salon")),
        branch_id: Some(BranchId::new("B3")),
        ..SessionRecord::signed_in("kept@example.com")
    }));
    let resolver = resolver(&platform, store);

    resolver.resolve_from_session(None).await;

    let snapshot = resolver.snapshot();
    assert_eq!(snapshot.auth_state, AuthState::Authenticated);
    assert_eq!(snapshot.identity.email.as_deref(), Some("kept@example.com"));
    assert_eq!(snapshot.identity.branch_id, Some(BranchId::new("B3")));
    assert_eq!(snapshot.business_type_source, BusinessTypeSource::SessionRecord);
}

#[tokio::test]
async fn null_session_without_record_is_unauthenticated() {
    let platform = seeded_platform();
    let resolver = resolver(&platform, Arc::new(InMemorySessionStore::new()));
    resolver.resolve_from_session(None).await;
    assert_eq!(resolver.auth_state(), AuthState::Unauthenticated);
    assert!(resolver.identity().is_cleared());
}

#[tokio::test]
async fn session_changes_apply_in_order() {
    let platform = seeded_platform();
    let resolver = resolver(&platform, Arc::new(InMemorySessionStore::new()));

    let (tx, rx) = mpsc::channel(4);
    tx.send(Some(session("u-emp", "emp@example.com"))).await.unwrap();
    tx.send(None).await.unwrap();
    tx.send(Some(session("u-cash", "cash@example.com"))).await.unwrap();
    drop(tx);

    resolver.listen(rx).await;

    let identity = resolver.identity();
    assert_eq!(identity.user_id, Some(UserId::new("u-cash")));
    assert_eq!(identity.primary_role, Some(Role::CASHIER));
}

#[tokio::test]
async fn platform_announces_sign_in_and_sign_out() {
    let platform = seeded_platform();
    let access = in_memory_access_control(&AccessConfig::default(), platform.clone());
    let mut changes = platform.subscribe();

    platform.complete_sign_in(session("u-emp", "emp@example.com"));
    let change = changes.recv().await.unwrap();
    access.on_session_change(change).await;
    assert_eq!(access.resolver().identity().primary_role, Some(Role::EMPLOYEE));

    access.logout().await;
    let change = changes.recv().await.unwrap();
    assert_eq!(change, None);
    access.on_session_change(change).await;
    assert_eq!(access.resolver().auth_state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn session_stream_keeps_scope_in_step() {
    let platform = seeded_platform();
    let access = in_memory_access_control(&AccessConfig::default(), platform.clone());
    let changes = platform.subscribe();

    platform.complete_sign_in(session("u-emp", "emp@example.com"));
    platform.complete_sign_in(session("u-cash", "cash@example.com"));
    platform.unsubscribe();

    access.listen(changes).await;

    let snapshot = access.snapshot();
    assert_eq!(snapshot.auth_state, AuthState::Authenticated);
    assert_eq!(snapshot.identity.user_id, Some(UserId::new("u-cash")));
    assert_eq!(
        snapshot.business_type.as_ref().map(|bt| bt.id.as_str()),
        Some("hotel")
    );
    assert_eq!(access.scope().branches().len(), 3);
    assert_eq!(
        snapshot.selected_branch.map(|b| b.id),
        Some(BranchId::new("B3"))
    );

    let guard = BusinessTypeGuard::new([BusinessTypeId::new("hotel")]);
    assert_eq!(access.check(&guard, "/rooms"), GuardOutcome::Render);
}

#[tokio::test]
async fn login_validates_and_does_not_touch_identity() {
    let platform = seeded_platform();
    let resolver = resolver(&platform, Arc::new(InMemorySessionStore::new()));

    assert_eq!(resolver.login("not-an-email").await, Err(SessionError::InvalidEmail));
    resolver.login(" Emp@Example.com ").await.unwrap();

    assert_eq!(platform.sign_in_requests(), vec!["emp@example.com".to_string()]);
    assert_eq!(resolver.auth_state(), AuthState::Unauthenticated);

    platform.set_failures(PlatformFailures {
        sign_in: true,
        ..Default::default()
    });
    assert!(matches!(
        resolver.login("emp@example.com").await,
        Err(SessionError::Backend(_))
    ));
}

#[tokio::test]
async fn demo_login_synthesizes_manager_for_unknown_email() {
    let platform = seeded_platform();
    let store = Arc::new(InMemorySessionStore::new());
    let resolver = resolver(&platform, store.clone());

    resolver.demo_login("visitor@gym-central.com").await.unwrap();

    let snapshot = resolver.snapshot();
    assert_eq!(snapshot.auth_state, AuthState::Authenticated);
    assert_eq!(snapshot.identity.primary_role, Some(Role::MANAGER));
    assert_eq!(snapshot.identity.branch_id, Some(BranchId::new("demo-branch")));
    assert!(snapshot.identity.user_id.is_some());
    assert_eq!(snapshot.business_type_id, Some(BusinessTypeId::new("gym")));

    let record = store.load().unwrap().unwrap();
    assert!(record.is_authenticated);
    assert_eq!(record.email.as_deref(), Some("visitor@gym-central.com"));
    assert_eq!(record.branch_id, Some(BranchId::new("demo-branch")));
    assert!(record.saved_at.is_some());
}

#[tokio::test]
async fn demo_login_hydrates_existing_profile() {
    let platform = seeded_platform();
    let store = Arc::new(InMemorySessionStore::new());
    let resolver = resolver(&platform, store.clone());

    resolver.demo_login("CASH@example.com").await.unwrap();

    let snapshot = resolver.snapshot();
    assert_eq!(snapshot.identity.user_id, Some(UserId::new("u-cash")));
    assert_eq!(snapshot.identity.primary_role, Some(Role::CASHIER));
    assert_eq!(snapshot.identity.secondary_roles.len(), 1);
    assert_eq!(snapshot.business_type_id, Some(BusinessTypeId::new("hotel")));
    assert_eq!(
        store.load().unwrap().and_then(|r| r.business_type_id),
        Some(BusinessTypeId::new("hotel"))
    );
}

#[tokio::test]
async fn demo_login_with_failing_profile_lookup_stays_pending() {
    let platform = seeded_platform();
    platform.set_failures(PlatformFailures {
        profiles: true,
        ..Default::default()
    });
    let store = Arc::new(InMemorySessionStore::new());
    let resolver = resolver(&platform, store.clone());

    resolver.demo_login("emp@restaurant-mail.com").await.unwrap();

    let snapshot = resolver.snapshot();
    assert_eq!(snapshot.auth_state, AuthState::Authenticating);
    assert_eq!(snapshot.identity.email.as_deref(), Some("emp@restaurant-mail.com"));
    assert_eq!(snapshot.identity.primary_role, None);
    assert_eq!(snapshot.identity.branch_id, None);
    assert!(!resolver.has_role(&Role::MANAGER, None));
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn demo_login_with_failing_role_assignments_stays_pending() {
    let platform = seeded_platform();
    platform.set_failures(PlatformFailures {
        role_assignments: true,
        ..Default::default()
    });
    let store = Arc::new(InMemorySessionStore::new());
    let resolver = resolver(&platform, store.clone());

    resolver.demo_login("cash@example.com").await.unwrap();

    let snapshot = resolver.snapshot();
    assert_eq!(snapshot.auth_state, AuthState::Authenticating);
    assert_eq!(snapshot.identity.primary_role, None);
    assert!(snapshot.identity.secondary_roles.is_empty());
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn pending_demo_login_keeps_role_guard_waiting() {
    let platform = seeded_platform();
    platform.set_failures(PlatformFailures {
        profiles: true,
        ..Default::default()
    });
    let access = in_memory_access_control(&AccessConfig::default(), platform);

    access.demo_login("emp@restaurant-mail.com").await.unwrap();

    let guard = RoleGuard::new([Role::MANAGER]);
    assert_eq!(access.check(&guard, "/reports"), GuardOutcome::Pending);
}

#[tokio::test]
async fn demo_login_drops_email_guess_once_profile_is_known() {
    let platform = seeded_platform();
    platform.set_failures(PlatformFailures {
        businesses: true,
        ..Default::default()
    });
    let access = in_memory_access_control(&AccessConfig::default(), platform);

    // u-emp works for a hotel business but has "restaurant" in the address.
    access.demo_login("emp@restaurant-mail.com").await.unwrap();

    let resolved = access.resolver().snapshot();
    assert_eq!(resolved.auth_state, AuthState::Authenticated);
    assert_eq!(resolved.identity.primary_role, Some(Role::EMPLOYEE));
    assert_eq!(resolved.business_type_id, None);
    assert_eq!(resolved.business_type_source, BusinessTypeSource::Unknown);
    assert_eq!(access.scope().selected_business_type(), None);

    let guard = BusinessTypeGuard::new([BusinessTypeId::new("restaurant")]);
    let GuardOutcome::Denied { panel } = access.check(&guard, "/menu") else {
        panic!("expected inline denial");
    };
    assert_eq!(panel.kind, DenialKind::BusinessNotSelected);
}

#[tokio::test]
async fn logout_twice_leaves_identity_fully_cleared() {
    let platform = seeded_platform();
    let store = Arc::new(InMemorySessionStore::new());
    let resolver = resolver(&platform, store.clone());
    resolver.demo_login("cash@example.com").await.unwrap();

    resolver.logout().await;
    let first = resolver.snapshot();
    resolver.logout().await;
    let second = resolver.snapshot();

    for snapshot in [&first, &second] {
        assert_eq!(snapshot.auth_state, AuthState::Unauthenticated);
        assert!(snapshot.identity.is_cleared());
        assert_eq!(snapshot.business_type_id, None);
    }
    assert_eq!(first.identity, second.identity);
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn remote_sign_out_failure_still_clears_locally() {
    let platform = seeded_platform();
    let resolver = resolver(&platform, Arc::new(InMemorySessionStore::new()));
    resolver.demo_login("cash@example.com").await.unwrap();

    platform.set_failures(PlatformFailures {
        sign_out: true,
        ..Default::default()
    });
    resolver.logout().await;
    assert!(resolver.identity().is_cleared());
}

#[tokio::test]
async fn remote_role_catalog_redefines_super_roles() {
    let platform = seeded_platform();
    platform.set_role_catalog(vec![
        RoleCatalogEntry::new(Role::new("Owner"), "Owner", 1),
        RoleCatalogEntry::new(Role::CASHIER, "Cashier", 2),
        RoleCatalogEntry::new(Role::SUPER_MANAGER, "Super Manager", 3),
    ]);
    let resolver = resolver(&platform, Arc::new(InMemorySessionStore::new()));
    resolver.load_role_catalog().await;
    resolver
        .resolve_from_session(Some(session("u-cash", "cash@example.com")))
        .await;

    assert!(resolver.is_super());
    assert!(resolver.hierarchy().is_super_role(&Role::CASHIER));
}

// ─────────────────────────────────────────────────────────────────────────────
// Scope provider
// ─────────────────────────────────────────────────────────────────────────────

fn scope_with_persisted(
    platform: &Arc<InMemoryPlatform>,
    persisted: Option<&str>,
) -> ScopeProvider<Arc<InMemoryPlatform>, Arc<InMemorySessionStore>> {
    let store = match persisted {
        Some(id) => InMemorySessionStore::with_record(SessionRecord {
            branch_id: Some(BranchId::new(id)),
            ..Default::default()
        }),
        None => InMemorySessionStore::new(),
    };
    ScopeProvider::new(platform.clone(), Arc::new(store))
}

#[tokio::test]
async fn persisted_active_branch_is_restored() {
    let platform = seeded_platform();
    let scope = scope_with_persisted(&platform, Some("B3"));
    scope.load_branches(Some(&business_id()), None).await;
    assert_eq!(scope.selected_branch().map(|b| b.id), Some(BranchId::new("B3")));
}

#[tokio::test]
async fn persisted_inactive_branch_falls_back_to_first_active() {
    let platform = seeded_platform();
    let scope = scope_with_persisted(&platform, Some("B2"));
    scope.load_branches(Some(&business_id()), None).await;
    assert_eq!(scope.selected_branch().map(|b| b.id), Some(BranchId::new("B1")));
    assert!(scope.branches()[0].is_active, "missing flag defaults to active");
}

#[tokio::test]
async fn empty_branch_list_selects_nothing() {
    let platform = Arc::new(InMemoryPlatform::new());
    let scope = scope_with_persisted(&platform, Some("B1"));
    scope.load_branches(Some(&business_id()), None).await;
    assert!(scope.branches().is_empty());
    assert_eq!(scope.selected_branch(), None);
}

#[tokio::test]
async fn branch_load_failure_keeps_previous_list() {
    let platform = seeded_platform();
    let scope = scope_with_persisted(&platform, None);
    scope.load_branches(Some(&business_id()), None).await;

    platform.set_failures(PlatformFailures {
        branches: true,
        ..Default::default()
    });
    scope.load_branches(Some(&business_id()), None).await;
    assert_eq!(scope.branches().len(), 3);
}

#[tokio::test]
async fn selected_branch_is_persisted_for_next_session() {
    let platform = seeded_platform();
    let store = Arc::new(InMemorySessionStore::with_record(SessionRecord::signed_in(
        "emp@example.com",
    )));
    let scope = ScopeProvider::new(platform.clone(), store.clone());
    scope.load_branches(Some(&business_id()), None).await;

    let b3: Branch = branch_row("B3", Some(true)).into();
    scope.set_selected_branch(b3);

    let record = store.load().unwrap().unwrap();
    assert_eq!(record.branch_id, Some(BranchId::new("B3")));
    assert_eq!(record.email.as_deref(), Some("emp@example.com"));

    let next = ScopeProvider::new(platform.clone(), store);
    next.load_branches(Some(&business_id()), Some(&BranchId::new("B1"))).await;
    assert_eq!(next.selected_branch().map(|b| b.id), Some(BranchId::new("B3")));
}

#[tokio::test]
async fn business_type_follows_id_and_catalog() {
    let platform = seeded_platform();
    let scope = scope_with_persisted(&platform, None);

    scope.set_business_type_id(Some(BusinessTypeId::new("pharmacy")));
    assert_eq!(scope.term("customer"), "patient");

    scope.set_catalog(Vec::new());
    assert_eq!(scope.selected_business_type(), None);
    assert_eq!(scope.term("customer"), "customer");

    scope.set_business_type_id(None);
    scope.clear();
    assert!(scope.branches().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Guards end-to-end
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn anonymous_actor_is_sent_to_login() {
    let platform = seeded_platform();
    let access = in_memory_access_control(&AccessConfig::default(), platform);
    access.start().await;

    let guard = RoleGuard::new([Role::CASHIER]);
    let outcome = access.check(&guard, "/till");
    assert!(matches!(outcome, GuardOutcome::Redirect { ref to, .. } if to == "/login"));
}

#[tokio::test]
async fn super_manager_passes_cashier_guard_in_other_branch() {
    let platform = seeded_platform();
    let access = in_memory_access_control(&AccessConfig::default(), platform);
    access.on_session_change(Some(session("u-boss", "boss@example.com"))).await;

    let guard = RoleGuard::new([Role::CASHIER]).in_branch(BranchId::new("B3"));
    assert_eq!(access.check(&guard, "/till"), GuardOutcome::Render);
}

#[tokio::test]
async fn employee_in_hotel_business_sees_not_available_panel() {
    let platform = seeded_platform();
    let access = in_memory_access_control(&AccessConfig::default(), platform);
    access.on_session_change(Some(session("u-emp", "emp@example.com"))).await;
    assert_eq!(access.resolver().identity().branch_id, Some(BranchId::new("B1")));

    let guard = BusinessTypeGuard::new([BusinessTypeId::new("restaurant")]);
    let GuardOutcome::Denied { panel } = access.check(&guard, "/menu") else {
        panic!("expected inline denial");
    };
    assert_eq!(panel.kind, DenialKind::NotAvailableForBusinessType);
    assert_eq!(panel.link.as_deref(), Some("/"));
}

#[tokio::test]
async fn denied_actor_at_dashboard_gets_inline_panel_not_loop() {
    let platform = seeded_platform();
    let config = AccessConfig::from_lookup(|var| match var {
        "POSGATE_DASHBOARD_PATH" => Some("/home".to_string()),
        _ => None,
    });
    let access = in_memory_access_control(&config, platform);
    access.on_session_change(Some(session("u-emp", "emp@example.com"))).await;

    let stack = GuardStack::new()
        .with(AuthGuard)
        .with(RoleGuard::new([Role::MANAGER]));

    let mut nav = Navigation::start("/reports");
    nav.apply(access.check(&stack, nav.location()));
    assert_eq!(nav.follow_redirect(), Some("/home"));

    // The dashboard itself is behind the same stack.
    let state = nav.apply(access.check(&stack, nav.location())).clone();
    let NavigationState::DeniedTerminal { panel } = state else {
        panic!("expected terminal denial");
    };
    assert_eq!(panel.kind, DenialKind::AccessRestricted);
}

#[tokio::test]
async fn demo_login_then_logout_resets_scope() {
    let platform = seeded_platform();
    let access = in_memory_access_control(&AccessConfig::default(), platform);

    access.demo_login("cash@example.com").await.unwrap();
    assert_eq!(access.scope().branches().len(), 3);
    assert!(access.scope().selected_business_type().is_some());

    access.logout().await;
    let snapshot = access.snapshot();
    assert_eq!(snapshot.auth_state, AuthState::Unauthenticated);
    assert!(snapshot.business_type.is_none());
    assert!(snapshot.selected_branch.is_none());
    assert!(access.scope().branches().is_empty());
}
