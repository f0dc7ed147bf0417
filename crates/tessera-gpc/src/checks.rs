//! Validation of proof configurations and inputs.
//!
//! Every check fails fast on the first violation. A configuration either
//! validates completely or is rejected.

use std::collections::{BTreeMap, BTreeSet};

use tessera_core::{check_name, PodValue};
use tessera_crypto::{hash_tuple, hash_value, min_merkle_depth, Hash, PublicKey};
use tessera_pod::Pod;

use crate::bounds::{canonicalize_bounds, CanonicalBounds};
use crate::config::{EntryConfig, OwnerIdKind, ProofConfig, VirtualEntryConfig};
use crate::error::GpcError;
use crate::identifier::{EntryIdentifier, EntryName};
use crate::inputs::{ListElement, MembershipList, OwnerInput, ProofInputs};
use crate::requirements::RequirementVector;

/// Validate a configuration and derive the capacity it needs.
pub fn check_config(config: &ProofConfig) -> Result<RequirementVector, GpcError> {
    if config.pods.is_empty() {
        return Err(GpcError::TypeError(
            "configuration must contain at least one object".into(),
        ));
    }

    let mut req = RequirementVector {
        max_objects: config.pods.len(),
        ..Default::default()
    };

    for (object_name, object) in &config.pods {
        check_name(object_name)?;
        if object.entries.is_empty() {
            return Err(GpcError::TypeError(format!(
                "object {} must declare at least one entry",
                object_name
            )));
        }
        req.max_entries += object.entries.len();
        req.merkle_max_depth = req
            .merkle_max_depth
            .max(min_merkle_depth(object.entries.len()));

        for (entry_name, entry) in &object.entries {
            check_name(entry_name)?;
            let id = EntryIdentifier::new(object_name.clone(), entry_name.clone())?;
            check_entry_config(config, &id, entry, &mut req)?;
        }

        for (virtual_name, virtual_config) in [
            ("$contentID", &object.content_id),
            ("$signerPublicKey", &object.signer_public_key),
        ] {
            if let Some(virtual_config) = virtual_config {
                let id = EntryIdentifier::new(object_name.clone(), virtual_name)?;
                check_virtual_entry_config(config, &id, virtual_config, &mut req)?;
            }
        }
    }

    for (tuple_name, tuple) in &config.tuples {
        check_name(tuple_name)?;
        if tuple.arity() < 2 {
            return Err(GpcError::TypeError(format!(
                "tuple {} must have at least 2 entries, got {}",
                tuple_name,
                tuple.arity()
            )));
        }
        for member in &tuple.entries {
            check_reference(config, member, &format!("tuple {}", tuple_name))?;
        }
        for (list, _) in tuple.memberships() {
            check_name(list)?;
            req.max_lists += 1;
        }
        req.tuple_arities.insert(tuple_name.clone(), tuple.arity());
    }

    if req.max_lists > 0 {
        req.max_list_elements = 1;
    }

    tracing::debug!(
        objects = req.max_objects,
        entries = req.max_entries,
        depth = req.merkle_max_depth,
        numeric = req.max_numeric_values,
        inequalities = req.max_entry_inequalities,
        lists = req.max_lists,
        "configuration requirements derived"
    );
    Ok(req)
}

fn check_reference(config: &ProofConfig, target: &EntryIdentifier, from: &str) -> Result<(), GpcError> {
    if !config.pods.contains_key(&target.object) {
        return Err(GpcError::ReferenceError(format!(
            "{} refers to unknown object {}",
            from, target.object
        )));
    }
    if !config.resolves(target) {
        return Err(GpcError::ReferenceError(format!(
            "{} refers to unconfigured entry {}",
            from, target
        )));
    }
    Ok(())
}

fn check_equality_refs(
    config: &ProofConfig,
    id: &EntryIdentifier,
    equals: &Option<EntryIdentifier>,
    not_equals: &Option<EntryIdentifier>,
) -> Result<(), GpcError> {
    if equals.is_some() && not_equals.is_some() {
        return Err(GpcError::InvalidConfig(format!(
            "{} cannot declare both equalsEntry and notEqualsEntry",
            id
        )));
    }
    for target in equals.iter().chain(not_equals.iter()) {
        if target == id {
            return Err(GpcError::InvalidConfig(format!("{} is compared with itself", id)));
        }
        check_reference(config, target, &id.to_string())?;
    }
    Ok(())
}

fn check_entry_config(
    config: &ProofConfig,
    id: &EntryIdentifier,
    entry: &EntryConfig,
    req: &mut RequirementVector,
) -> Result<(), GpcError> {
    if let Some(kind) = entry.is_owner_id {
        if entry.equals_entry.is_some() || entry.not_equals_entry.is_some() {
            return Err(GpcError::InvalidConfig(format!(
                "{} is an owner ID and cannot declare equalsEntry or notEqualsEntry",
                id
            )));
        }
        match kind {
            OwnerIdKind::V3 => req.include_owner_v3 = true,
            OwnerIdKind::V4 => req.include_owner_v4 = true,
        }
    }
    check_equality_refs(config, id, &entry.equals_entry, &entry.not_equals_entry)?;

    if canonicalize_bounds(entry.in_range, entry.not_in_range, &id.to_string())?.is_some() {
        req.max_numeric_values += 1;
    }

    for (op, target) in entry.inequalities() {
        check_reference(config, target, &id.to_string())?;
        if target == id {
            return Err(GpcError::InvalidConfig(format!("{} is compared with itself", id)));
        }
        let target_config = config.entry(target).ok_or_else(|| {
            GpcError::TypeError(format!(
                "{} {} {}: virtual entries are not numeric",
                id,
                op.as_str(),
                target
            ))
        })?;
        if !entry.has_bounds() || !target_config.has_bounds() {
            return Err(GpcError::InvalidConfig(format!(
                "{} {} {} needs range checks on both entries",
                id,
                op.as_str(),
                target
            )));
        }
        req.max_entry_inequalities += 1;
    }

    for (list, _) in entry.memberships() {
        check_name(list)?;
        req.max_lists += 1;
    }
    Ok(())
}

fn check_virtual_entry_config(
    config: &ProofConfig,
    id: &EntryIdentifier,
    entry: &VirtualEntryConfig,
    req: &mut RequirementVector,
) -> Result<(), GpcError> {
    check_equality_refs(config, id, &entry.equals_entry, &entry.not_equals_entry)?;
    for (list, _) in entry.memberships() {
        check_name(list)?;
        req.max_lists += 1;
    }
    Ok(())
}

/// Validate inputs on their own and derive the capacity they need.
pub fn check_inputs(inputs: &ProofInputs) -> Result<RequirementVector, GpcError> {
    if inputs.pods.is_empty() {
        return Err(GpcError::TypeError("inputs must contain at least one POD".into()));
    }

    let mut req = RequirementVector {
        max_objects: inputs.pods.len(),
        ..Default::default()
    };
    for (name, pod) in &inputs.pods {
        check_name(name)?;
        req.merkle_max_depth = req.merkle_max_depth.max(pod.merkle_depth());
    }

    if let Some(owner) = &inputs.owner {
        check_owner_shape(owner)?;
    }

    for (list_name, list) in &inputs.membership_lists {
        check_name(list_name)?;
        check_list_shape(list_name, list)?;
        req.max_lists += 1;
        req.max_list_elements = req.max_list_elements.max(list.len());
    }

    Ok(req)
}

fn check_owner_shape(owner: &OwnerInput) -> Result<(), GpcError> {
    if owner.identity_v3.is_none() && owner.identity_v4.is_none() {
        return Err(GpcError::TypeError(
            "owner must carry a V3 commitment or a V4 public key".into(),
        ));
    }
    if let Some(public_key) = &owner.identity_v4 {
        PublicKey::from_bytes(public_key).map_err(|e| {
            GpcError::TypeError(format!("owner V4 identity is not a valid public key: {}", e))
        })?;
    }
    Ok(())
}

fn check_list_shape(name: &str, list: &MembershipList) -> Result<usize, GpcError> {
    let first = list.first().ok_or_else(|| {
        GpcError::TypeError(format!("membership list {} must not be empty", name))
    })?;
    let width = first.width();
    if let ListElement::Tuple(_) = first {
        if width < 2 {
            return Err(GpcError::TypeError(format!(
                "membership list {} has tuples of width {}, minimum is 2",
                name, width
            )));
        }
    }
    for (i, element) in list.iter().enumerate() {
        let same_kind = matches!(
            (first, element),
            (ListElement::Value(_), ListElement::Value(_)) | (ListElement::Tuple(_), ListElement::Tuple(_))
        );
        if !same_kind || element.width() != width {
            return Err(GpcError::TypeError(format!(
                "membership list {} element {} has width {}, expected {}",
                name,
                i,
                element.width(),
                width
            )));
        }
    }
    Ok(width)
}

/// Check that concrete inputs satisfy every constraint of a configuration.
pub fn check_inputs_against_config(config: &ProofConfig, inputs: &ProofInputs) -> Result<(), GpcError> {
    for object in config.pods.keys() {
        if !inputs.pods.contains_key(object) {
            return Err(GpcError::ReferenceError(format!(
                "configured object {} has no input POD",
                object
            )));
        }
    }
    for object in inputs.pods.keys() {
        if !config.pods.contains_key(object) {
            return Err(GpcError::ReferenceError(format!(
                "input POD {} is not in the configuration",
                object
            )));
        }
    }

    let resolver = Resolver { pods: &inputs.pods };
    let mut has_owner_entry = false;

    for (object_name, object) in &config.pods {
        for (entry_name, entry) in &object.entries {
            let id = EntryIdentifier::new(object_name.clone(), entry_name.clone())?;
            let value = resolver.resolve(&id)?;

            if let Some(kind) = entry.is_owner_id {
                has_owner_entry = true;
                check_owner_entry(&id, &value, kind, inputs.owner.as_ref())?;
            }
            check_equality(&resolver, &id, &value, &entry.equals_entry, &entry.not_equals_entry)?;

            let bounds = canonicalize_bounds(entry.in_range, entry.not_in_range, &id.to_string())?;
            if let Some(bounds) = bounds {
                check_bounds(&id, &value, &bounds)?;
            }

            for (op, target) in entry.inequalities() {
                let left = numeric_value(&id, &value)?;
                let right = numeric_value(target, &resolver.resolve(target)?)?;
                if !op.holds(left, right) {
                    return Err(GpcError::ConstraintViolation(format!(
                        "{} = {} must be {} {} = {}",
                        id,
                        left,
                        op.as_str(),
                        target,
                        right
                    )));
                }
            }

            for (list, member) in entry.memberships() {
                check_membership(&id.to_string(), &hash_value(&value), 1, list, member, inputs)?;
            }
        }

        for (virtual_name, virtual_config) in [
            ("$contentID", &object.content_id),
            ("$signerPublicKey", &object.signer_public_key),
        ] {
            let Some(virtual_config) = virtual_config else {
                continue;
            };
            let id = EntryIdentifier::new(object_name.clone(), virtual_name)?;
            let value = resolver.resolve(&id)?;
            check_equality(
                &resolver,
                &id,
                &value,
                &virtual_config.equals_entry,
                &virtual_config.not_equals_entry,
            )?;
            for (list, member) in virtual_config.memberships() {
                check_membership(&id.to_string(), &hash_value(&value), 1, list, member, inputs)?;
            }
        }
    }

    for (tuple_name, tuple) in &config.tuples {
        let values = tuple
            .entries
            .iter()
            .map(|id| resolver.resolve(id))
            .collect::<Result<Vec<_>, _>>()?;
        let hash = hash_tuple(&values);
        for (list, member) in tuple.memberships() {
            let site = format!("tuple {}", tuple_name);
            check_membership(&site, &hash, tuple.arity(), list, member, inputs)?;
        }
    }

    if inputs
        .owner
        .as_ref()
        .is_some_and(|owner| owner.external_nullifier.is_some())
        && !has_owner_entry
    {
        return Err(GpcError::InvalidConfig(
            "an external nullifier needs an entry marked isOwnerID".into(),
        ));
    }

    if config.unique_pods {
        let mut seen = BTreeMap::new();
        for (name, pod) in &inputs.pods {
            if let Some(previous) = seen.insert(pod.content_id().clone(), name) {
                return Err(GpcError::ConstraintViolation(format!(
                    "uniquePODs: {} and {} are the same POD",
                    previous, name
                )));
            }
        }
    }

    check_list_names(config, inputs)?;
    Ok(())
}

/// Run every check and return the final requirement vector.
pub fn check_proof_args(config: &ProofConfig, inputs: &ProofInputs) -> Result<RequirementVector, GpcError> {
    let config_req = check_config(config)?;
    let inputs_req = check_inputs(inputs)?;
    check_inputs_against_config(config, inputs)?;
    let req = config_req.merge(&inputs_req)?;
    tracing::debug!(
        objects = req.max_objects,
        entries = req.max_entries,
        lists = req.max_lists,
        list_elements = req.max_list_elements,
        "proof requirements merged"
    );
    Ok(req)
}

struct Resolver<'a> {
    pods: &'a BTreeMap<String, Pod>,
}

impl Resolver<'_> {
    fn resolve(&self, id: &EntryIdentifier) -> Result<PodValue, GpcError> {
        let pod = self.pods.get(&id.object).ok_or_else(|| {
            GpcError::ReferenceError(format!("no input POD named {}", id.object))
        })?;
        match &id.entry {
            EntryName::Virtual(v) => Ok(pod.virtual_entry(*v)),
            EntryName::Regular(name) => pod.entries().get(name).cloned().ok_or_else(|| {
                GpcError::ReferenceError(format!("input POD {} has no entry {}", id.object, name))
            }),
        }
    }
}

fn check_owner_entry(
    id: &EntryIdentifier,
    value: &PodValue,
    kind: OwnerIdKind,
    owner: Option<&OwnerInput>,
) -> Result<(), GpcError> {
    let owner = owner.ok_or_else(|| {
        GpcError::ReferenceError(format!("{} is an owner ID but no owner was supplied", id))
    })?;
    match kind {
        OwnerIdKind::V3 => {
            let commitment = owner.identity_v3.as_ref().ok_or_else(|| {
                GpcError::ReferenceError(format!("{} needs a V3 owner identity", id))
            })?;
            let actual = value.as_cryptographic().ok_or_else(|| {
                GpcError::TypeError(format!(
                    "{} is a V3 owner ID and must be cryptographic, got {}",
                    id,
                    value.value_type()
                ))
            })?;
            if actual != commitment {
                return Err(GpcError::ConstraintViolation(format!(
                    "{} does not match the owner's identity commitment",
                    id
                )));
            }
        }
        OwnerIdKind::V4 => {
            let public_key = owner.identity_v4.as_ref().ok_or_else(|| {
                GpcError::ReferenceError(format!("{} needs a V4 owner identity", id))
            })?;
            let actual = value.as_public_key().ok_or_else(|| {
                GpcError::TypeError(format!(
                    "{} is a V4 owner ID and must be an eddsa_pubkey, got {}",
                    id,
                    value.value_type()
                ))
            })?;
            if actual != public_key {
                return Err(GpcError::ConstraintViolation(format!(
                    "{} does not match the owner's public key",
                    id
                )));
            }
        }
    }
    Ok(())
}

fn check_equality(
    resolver: &Resolver<'_>,
    id: &EntryIdentifier,
    value: &PodValue,
    equals: &Option<EntryIdentifier>,
    not_equals: &Option<EntryIdentifier>,
) -> Result<(), GpcError> {
    if let Some(target) = equals {
        if hash_value(value) != hash_value(&resolver.resolve(target)?) {
            return Err(GpcError::ConstraintViolation(format!(
                "{} must equal {}",
                id, target
            )));
        }
    }
    if let Some(target) = not_equals {
        if hash_value(value) == hash_value(&resolver.resolve(target)?) {
            return Err(GpcError::ConstraintViolation(format!(
                "{} must not equal {}",
                id, target
            )));
        }
    }
    Ok(())
}

fn numeric_value(id: &EntryIdentifier, value: &PodValue) -> Result<i64, GpcError> {
    value.as_int().ok_or_else(|| {
        GpcError::TypeError(format!(
            "{} must be an int for numeric checks, got {}",
            id,
            value.value_type()
        ))
    })
}

fn check_bounds(id: &EntryIdentifier, value: &PodValue, bounds: &CanonicalBounds) -> Result<(), GpcError> {
    let n = numeric_value(id, value)?;
    if !bounds.contains(n) {
        return Err(GpcError::RangeError(format!(
            "{} = {} is outside {}",
            id,
            n,
            bounds.describe()
        )));
    }
    Ok(())
}

fn check_membership(
    site: &str,
    hash: &Hash,
    width: usize,
    list_name: &str,
    member: bool,
    inputs: &ProofInputs,
) -> Result<(), GpcError> {
    let list = inputs.membership_lists.get(list_name).ok_or_else(|| {
        GpcError::ReferenceError(format!(
            "{} refers to membership list {} which was not supplied",
            site, list_name
        ))
    })?;
    let list_width = list.first().map_or(width, ListElement::width);
    if list_width != width {
        return Err(GpcError::TypeError(format!(
            "{} has width {} but list {} has width {}",
            site, width, list_name, list_width
        )));
    }
    let found = list.iter().any(|element| element.hash() == *hash);
    if found != member {
        let relation = if member { "a member" } else { "not a member" };
        return Err(GpcError::ConstraintViolation(format!(
            "{} must be {} of list {}",
            site, relation, list_name
        )));
    }
    Ok(())
}

fn check_list_names(config: &ProofConfig, inputs: &ProofInputs) -> Result<(), GpcError> {
    let mut referenced = BTreeSet::new();
    for object in config.pods.values() {
        for entry in object.entries.values() {
            referenced.extend(entry.memberships().into_iter().map(|(list, _)| list));
        }
        for virtual_config in [&object.content_id, &object.signer_public_key].into_iter().flatten() {
            referenced.extend(virtual_config.memberships().into_iter().map(|(list, _)| list));
        }
    }
    for tuple in config.tuples.values() {
        referenced.extend(tuple.memberships().into_iter().map(|(list, _)| list));
    }

    for list in &referenced {
        if !inputs.membership_lists.contains_key(*list) {
            return Err(GpcError::ReferenceError(format!(
                "membership list {} is configured but not supplied",
                list
            )));
        }
    }
    for list in inputs.membership_lists.keys() {
        if !referenced.contains(list.as_str()) {
            return Err(GpcError::ReferenceError(format!(
                "membership list {} is supplied but never referenced",
                list
            )));
        }
    }
    Ok(())
}
