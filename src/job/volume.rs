//! Conversion of rule volumes and resources into their job representation.

use super::{ContainerResources, EmptyDirVolume, PodVolume, PodVolumeSource, Quantity, SynthesisError};
use crate::rules::{ResourceRequirements, Volume};
use std::collections::BTreeMap;

/// Convert rule-level volumes. Each must carry exactly one source.
pub fn convert_volumes(volumes: &[Volume]) -> Result<Vec<PodVolume>, SynthesisError> {
    volumes.iter().map(convert_volume).collect()
}

fn convert_volume(volume: &Volume) -> Result<PodVolume, SynthesisError> {
    let count = volume.source.source_count();
    if count != 1 {
        return Err(SynthesisError::Volume {
            volume: volume.name.clone(),
            count,
        });
    }

    let src = &volume.source;
    let source = if let Some(cm) = &src.config_map {
        PodVolumeSource::ConfigMap(cm.clone())
    } else if let Some(secret) = &src.secret {
        PodVolumeSource::Secret(secret.clone())
    } else if let Some(dir) = &src.empty_dir {
        let size_limit = dir
            .size_limit
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<Quantity>)
            .transpose()
            .map_err(|source| SynthesisError::SizeLimit {
                volume: volume.name.clone(),
                source,
            })?;
        PodVolumeSource::EmptyDir(EmptyDirVolume {
            medium: dir.medium.clone().filter(|m| !m.is_empty()),
            size_limit,
        })
    } else if let Some(pvc) = &src.persistent_volume_claim {
        PodVolumeSource::PersistentVolumeClaim(pvc.clone())
    } else if let Some(host) = &src.host_path {
        PodVolumeSource::HostPath(host.clone())
    } else {
        return Err(SynthesisError::Volume {
            volume: volume.name.clone(),
            count: 0,
        });
    };

    Ok(PodVolume {
        name: volume.name.clone(),
        source,
    })
}

/// Parse declared limits and requests into quantities.
pub fn convert_resources(
    resources: Option<&ResourceRequirements>,
) -> Result<ContainerResources, SynthesisError> {
    let Some(resources) = resources else {
        return Ok(ContainerResources::default());
    };

    Ok(ContainerResources {
        limits: parse_quantities("limit", &resources.limits)?,
        requests: parse_quantities("request", &resources.requests)?,
    })
}

fn parse_quantities(
    kind: &'static str,
    declared: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, Quantity>, SynthesisError> {
    declared
        .iter()
        .map(|(resource, value)| {
            value
                .parse::<Quantity>()
                .map(|q| (resource.clone(), q))
                .map_err(|source| SynthesisError::Quantity {
                    kind,
                    resource: resource.clone(),
                    source,
                })
        })
        .collect()
}
