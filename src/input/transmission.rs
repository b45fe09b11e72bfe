//! Code for reading transmission links from a CSV file.
use super::{input_err_msg, read_csv_optional};
use crate::asset::{CapacityBounds, Financing};
use crate::global::Period;
use crate::id::{CommodityID, IDCollection, SiteID};
use crate::transmission::{Transmission, TransmissionKey, TransmissionMap};
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const TRANSMISSIONS_FILE_NAME: &str = "transmissions.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct TransmissionRaw {
    period: Period,
    site_in: String,
    site_out: String,
    transmission: String,
    commodity: String,
    eff: f64,
    inst_cap: f64,
    cap_lo: f64,
    cap_up: f64,
    inv_cost: f64,
    fix_cost: f64,
    var_cost: f64,
    wacc: f64,
    depreciation: u32,
    #[serde(default)]
    lifetime: Option<u32>,
}

/// Read transmission links from the specified model directory.
///
/// The file is optional. If it is absent or empty, transmission is disabled.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `periods` - All modelled periods
/// * `site_ids` - All known sites
/// * `commodity_ids` - All known commodities
pub fn read_transmissions(
    model_dir: &Path,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<TransmissionMap> {
    let file_path = model_dir.join(TRANSMISSIONS_FILE_NAME);
    let rows = read_csv_optional(&file_path)?;
    read_transmissions_from_iter(rows.into_iter(), periods, site_ids, commodity_ids)
        .with_context(|| input_err_msg(&file_path))
}

fn read_transmissions_from_iter<I>(
    iter: I,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<TransmissionMap>
where
    I: Iterator<Item = TransmissionRaw>,
{
    let mut map = TransmissionMap::new();
    for row in iter {
        ensure!(
            periods.contains(&row.period),
            "Transmission {} given for unknown period {}",
            row.transmission,
            row.period
        );
        let key = TransmissionKey {
            period: row.period,
            site_in: site_ids.get_id(&row.site_in)?,
            site_out: site_ids.get_id(&row.site_out)?,
            transmission: row.transmission.into(),
            commodity: commodity_ids.get_id(&row.commodity)?,
        };
        ensure!(
            key.site_in != key.site_out,
            "Transmission {key} must connect two different sites"
        );
        let transmission = Transmission {
            capacity: CapacityBounds {
                installed: row.inst_cap,
                lower: row.cap_lo,
                upper: row.cap_up,
            },
            eff: row.eff,
            inv_cost: row.inv_cost,
            fix_cost: row.fix_cost,
            var_cost: row.var_cost,
            financing: Financing {
                wacc: Dimensionless(row.wacc),
                depreciation: row.depreciation,
                lifetime: row.lifetime,
            },
        };
        transmission
            .validate()
            .with_context(|| format!("Invalid parameters for transmission {key}"))?;
        ensure!(
            map.insert(key.clone(), transmission).is_none(),
            "Duplicate entry for transmission {key}"
        );
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;

    fn row(site_in: &str, site_out: &str) -> TransmissionRaw {
        TransmissionRaw {
            period: 2020,
            site_in: site_in.into(),
            site_out: site_out.into(),
            transmission: "hvac".into(),
            commodity: "Elec".into(),
            eff: 0.9,
            inst_cap: 0.0,
            cap_lo: 0.0,
            cap_up: f64::INFINITY,
            inv_cost: 1000.0,
            fix_cost: 10.0,
            var_cost: 0.0,
            wacc: 0.07,
            depreciation: 40,
            lifetime: None,
        }
    }

    #[test]
    fn test_read_transmissions_from_iter() {
        let site_ids = ["North".into(), "South".into()].into_iter().collect();
        let commodity_ids = ["Elec".into()].into_iter().collect();
        let map = read_transmissions_from_iter(
            [row("North", "South"), row("South", "North")].into_iter(),
            &[2020],
            &site_ids,
            &commodity_ids,
        )
        .unwrap();
        assert_eq!(map.len(), 2);
        let (key, _) = map.first().unwrap();
        assert!(map.contains_key(&key.reversed()));
    }

    #[test]
    fn test_read_transmissions_same_site() {
        let site_ids = ["North".into()].into_iter().collect();
        let commodity_ids = ["Elec".into()].into_iter().collect();
        assert_error!(
            read_transmissions_from_iter(
                [row("North", "North")].into_iter(),
                &[2020],
                &site_ids,
                &commodity_ids
            ),
            "Transmission (2020, North, North, hvac, Elec) must connect two different sites"
        );
    }
}
