//! Property-based checks of the constraint engine and identifier assigner.

use crate::common::{self, builders::AttributeBuilder};
use ldap_schema_harness::directory::{DirectoryClient, SearchRequest, attrs};
use ldap_schema_harness::error::ViolationKind;
use ldap_schema_harness::schema::types::derive_ldap_display_name;
use ldap_schema_harness::schema::{
    AggregateSnapshot, ConstraintEngine, FunctionalLevel, IntIdAssigner, SchemaSet,
    ValidationVerdict, assert_consistent,
};
use ldap_schema_harness::value_objects::Oid;
use proptest::prelude::*;
use std::collections::HashSet;

fn oid_strategy() -> impl Strategy<Value = String> {
    "1\\.2\\.840\\.[1-9][0-9]{0,5}(\\.[1-9][0-9]{0,5}){1,4}"
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}(-[A-Za-z0-9]{1,8}){0,3}"
}

proptest! {
    #[test]
    fn test_display_names_drop_hyphens(name in name_strategy()) {
        let display = derive_ldap_display_name(&name);
        prop_assert!(!display.contains('-'));
        prop_assert_eq!(display.len(), name.len() - name.matches('-').count());
        prop_assert_eq!(display.chars().next(), name.chars().next());
    }

    #[test]
    fn test_assigned_identifier_is_in_range(oid in oid_strategy(), level in 2u32..=7) {
        let forest = common::forest(FunctionalLevel::new(level).unwrap());
        let schema = SchemaSet::bootstrap().unwrap();
        let attribute = AttributeBuilder::new("prop-Attr").oid(&oid).build();

        let id = IntIdAssigner::new().assign(&attribute, &forest, &schema);

        prop_assert!(id.is_some_and(IntIdAssigner::in_range));
        let seed = IntIdAssigner::seed_for(&Oid::new(oid.clone()).unwrap());
        prop_assert_eq!(seed, IntIdAssigner::seed_for(&Oid::new(oid).unwrap()));
    }

    #[test]
    fn test_client_identifier_always_refused(id in any::<i32>(), base in any::<bool>()) {
        let forest = common::forest(FunctionalLevel::DS_DC_FUNCTION_2008);
        let schema = SchemaSet::bootstrap().unwrap();
        let mut builder = AttributeBuilder::new("client-Attr").client_id(id);
        if base {
            builder = builder.base_object();
        }

        let verdict = ConstraintEngine::new().evaluate(&builder.build(), &forest, &schema);

        prop_assert_eq!(verdict.kind(), Some(ViolationKind::UnwillingToPerform));
    }

    #[test]
    fn test_fresh_attribute_is_accepted(name in name_strategy(), oid in oid_strategy()) {
        let forest = common::forest(FunctionalLevel::DS_DC_FUNCTION_2008);
        let schema = SchemaSet::bootstrap().unwrap();
        prop_assume!(schema.find(&name).is_none());
        prop_assume!(schema.find(&derive_ldap_display_name(&name)).is_none());
        prop_assume!(schema.find_by_oid(&oid).is_none());

        let attribute = AttributeBuilder::new(&name).oid(&oid).build();
        let verdict = ConstraintEngine::new().evaluate(&attribute, &forest, &schema);

        prop_assert_eq!(verdict, ValidationVerdict::Accepted);
    }

    #[test]
    fn test_consistency_verdict_is_repeatable(
        mutation in 0usize..5,
        pick in any::<prop::sample::Index>(),
        name in name_strategy(),
    ) {
        let schema = SchemaSet::bootstrap().unwrap();
        let mut snapshot = AggregateSnapshot::from_schema(&schema);
        let ghost = format!("ghost-{}", name);
        match mutation {
            0 => {}
            1 => {
                let mut copy = pick.get(&snapshot.attribute_types).clone();
                copy.names = vec![ghost];
                snapshot.attribute_types.push(copy);
            }
            2 => {
                let i = pick.index(snapshot.object_classes.len());
                snapshot.object_classes[i].superclasses.push(ghost);
            }
            3 => {
                let i = pick.index(snapshot.object_classes.len());
                snapshot.object_classes[i].must.push(ghost);
            }
            _ => {
                let i = pick.index(snapshot.content_rules.len());
                snapshot.content_rules[i].auxiliary.push(ghost);
            }
        }
        let before = snapshot.clone();

        let first = assert_consistent(&snapshot);
        let second = assert_consistent(&snapshot);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.is_ok(), mutation == 0);
        prop_assert_eq!(&snapshot, &before);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_directory_identifiers_are_unique(count in 1usize..12) {
        tokio_test::block_on(async {
            let directory = common::directory();
            let forest = directory.forest().await;

            let mut ids = HashSet::new();
            for n in 0..count {
                let attribute = AttributeBuilder::new(&format!("many-{}-Attr", n)).build();
                let dn = forest.element_dn(attribute.name());
                directory.add(attribute.to_entry(&forest)).await.unwrap();

                let entries = directory
                    .search(SearchRequest::base(dn).with_attributes([attrs::MS_DS_INT_ID]))
                    .await
                    .unwrap();
                let id: i32 = entries[0].first(attrs::MS_DS_INT_ID).unwrap().parse().unwrap();
                assert!(IntIdAssigner::in_range(id));
                assert!(ids.insert(id), "msDS-IntId {} assigned twice", id);
            }
        });
    }
}
