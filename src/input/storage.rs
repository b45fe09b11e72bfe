//! Code for reading storage units from a CSV file.
use super::{deserialise_optional_non_negative, input_err_msg, read_csv_optional};
use crate::asset::{CapacityBounds, Financing};
use crate::global::Period;
use crate::id::{CommodityID, IDCollection, SiteID};
use crate::storage::{Storage, StorageKey, StorageMap};
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const STORAGES_FILE_NAME: &str = "storages.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct StorageRaw {
    period: Period,
    site: String,
    storage: String,
    commodity: String,
    inst_cap_c: f64,
    cap_lo_c: f64,
    cap_up_c: f64,
    inst_cap_p: f64,
    cap_lo_p: f64,
    cap_up_p: f64,
    eff_in: f64,
    eff_out: f64,
    inv_cost_p: f64,
    inv_cost_c: f64,
    fix_cost_p: f64,
    fix_cost_c: f64,
    var_cost_p: f64,
    var_cost_c: f64,
    wacc: f64,
    depreciation: u32,
    #[serde(default)]
    lifetime: Option<u32>,
    #[serde(default)]
    discharge: f64,
    #[serde(default, deserialize_with = "deserialise_optional_non_negative")]
    init: Option<f64>,
    #[serde(default)]
    ep_ratio: Option<f64>,
}

/// Read storage units from the specified model directory.
///
/// The file is optional. If it is absent or empty, storage is disabled.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `periods` - All modelled periods
/// * `site_ids` - All known sites
/// * `commodity_ids` - All known commodities
pub fn read_storages(
    model_dir: &Path,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<StorageMap> {
    let file_path = model_dir.join(STORAGES_FILE_NAME);
    let rows = read_csv_optional(&file_path)?;
    read_storages_from_iter(rows.into_iter(), periods, site_ids, commodity_ids)
        .with_context(|| input_err_msg(&file_path))
}

fn read_storages_from_iter<I>(
    iter: I,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<StorageMap>
where
    I: Iterator<Item = StorageRaw>,
{
    let mut map = StorageMap::new();
    for row in iter {
        ensure!(
            periods.contains(&row.period),
            "Storage {} given for unknown period {}",
            row.storage,
            row.period
        );
        let key = StorageKey {
            period: row.period,
            site: site_ids.get_id(&row.site)?,
            storage: row.storage.into(),
            commodity: commodity_ids.get_id(&row.commodity)?,
        };
        let storage = Storage {
            power: CapacityBounds {
                installed: row.inst_cap_p,
                lower: row.cap_lo_p,
                upper: row.cap_up_p,
            },
            energy: CapacityBounds {
                installed: row.inst_cap_c,
                lower: row.cap_lo_c,
                upper: row.cap_up_c,
            },
            eff_in: row.eff_in,
            eff_out: row.eff_out,
            discharge: row.discharge,
            init: row.init,
            ep_ratio: row.ep_ratio,
            inv_cost_p: row.inv_cost_p,
            inv_cost_c: row.inv_cost_c,
            fix_cost_p: row.fix_cost_p,
            fix_cost_c: row.fix_cost_c,
            var_cost_p: row.var_cost_p,
            var_cost_c: row.var_cost_c,
            financing: Financing {
                wacc: Dimensionless(row.wacc),
                depreciation: row.depreciation,
                lifetime: row.lifetime,
            },
        };
        storage
            .validate()
            .with_context(|| format!("Invalid parameters for storage {key}"))?;
        ensure!(
            map.insert(key.clone(), storage).is_none(),
            "Duplicate entry for storage {key}"
        );
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_read_storages() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(STORAGES_FILE_NAME)).unwrap();
            writeln!(
                file,
                "period,site,storage,commodity,inst_cap_c,cap_lo_c,cap_up_c,inst_cap_p,cap_lo_p,cap_up_p,eff_in,eff_out,inv_cost_p,inv_cost_c,fix_cost_p,fix_cost_c,var_cost_p,var_cost_c,wacc,depreciation,lifetime,discharge,init,ep_ratio
2020,North,Battery,Elec,0,0,inf,0,0,inf,0.9,0.9,100,200,1,2,0.01,0,0.07,20,,0,0.5,
2020,North,Pump,Elec,100,0,100,10,0,10,0.8,0.9,0,0,0,0,0,0,0.07,50,,0.001,,10"
            )
            .unwrap();
        }
        let site_ids = ["North".into()].into_iter().collect();
        let commodity_ids = ["Elec".into()].into_iter().collect();
        let map = read_storages(dir.path(), &[2020], &site_ids, &commodity_ids).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[0].init, Some(0.5));
        assert_eq!(map[0].ep_ratio, None);
        assert_eq!(map[1].init, None);
        assert_eq!(map[1].ep_ratio, Some(10.0));
    }

    #[test]
    fn test_read_storages_missing_file() {
        let dir = tempdir().unwrap();
        let site_ids = IndexSet::new();
        let commodity_ids = IndexSet::new();
        assert!(
            read_storages(dir.path(), &[2020], &site_ids, &commodity_ids)
                .unwrap()
                .is_empty()
        );
    }
}
