use crate::model::{CanonicalState, ForceHttps, Owner, RemoteApplication, ValidationError};

use super::vhost::VhostPattern;

/// Map the remote representation back into canonical state.
///
/// Undoes the request encodings: force-https is decoded from its string
/// form and homogeneous is flipped back. The build flavor is reported only
/// while separate build is on. The organization comes from the routing
/// owner, not from the remote owner id.
pub fn to_canonical(
    application: &RemoteApplication,
    owner: &Owner,
    vhosts: &VhostPattern,
) -> Result<CanonicalState, ValidationError> {
    check_collection("tags", application.tags.iter().map(String::as_str))?;
    check_collection("vhosts", application.hostnames())?;
    Ok(build_state(application, owner, vhosts))
}

/// Like [`to_canonical`], but blank tags and hostnames are dropped instead
/// of rejected. The first blank entry found is returned with the state.
pub fn to_canonical_lossy(
    application: &RemoteApplication,
    owner: &Owner,
    vhosts: &VhostPattern,
) -> (CanonicalState, Option<ValidationError>) {
    let problem = check_collection("tags", application.tags.iter().map(String::as_str))
        .and_then(|()| check_collection("vhosts", application.hostnames()))
        .err();
    (build_state(application, owner, vhosts), problem)
}

fn build_state(
    application: &RemoteApplication,
    owner: &Owner,
    vhosts: &VhostPattern,
) -> CanonicalState {
    let partition = vhosts.partition(application.hostnames().filter(|host| !is_blank(host)));
    let instance = &application.instance;

    CanonicalState {
        id: application.id.clone(),
        name: application.name.clone(),
        description: application.description.clone(),
        instance_type: instance.instance_type.clone(),
        zone: application.zone.clone(),
        deploy_type: application.deployment.deploy_type.clone(),
        deploy_url: application.deployment.url.clone(),
        organization_id: owner.organization_id().map(str::to_string),
        owner_id: application.owner_id.clone(),
        min_instances: instance.min_instances,
        max_instances: instance.max_instances,
        max_allowed_instances: instance.max_allowed_instances,
        min_flavor: instance.min_flavor.name.clone(),
        max_flavor: instance.max_flavor.name.clone(),
        separate_build: application.separate_build,
        build_flavor: application
            .build_flavor
            .as_ref()
            .filter(|_| application.separate_build)
            .map(|flavor| flavor.name.clone()),
        homogeneous: !application.homogeneous,
        sticky_sessions: application.sticky_sessions,
        cancel_on_push: application.cancel_on_push,
        force_https: ForceHttps::decode(&application.force_https),
        favorite: application.favorite,
        archived: application.archived,
        tags: application
            .tags
            .iter()
            .filter(|tag| !is_blank(tag))
            .cloned()
            .collect(),
        vhost: partition.default,
        additional_vhosts: partition.additional,
    }
}

fn is_blank(entry: &str) -> bool {
    entry.trim().is_empty()
}

fn check_collection<'a>(
    field: &'static str,
    entries: impl Iterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    for (index, entry) in entries.enumerate() {
        if is_blank(entry) {
            return Err(ValidationError::BlankEntry { field, index });
        }
    }
    Ok(())
}
