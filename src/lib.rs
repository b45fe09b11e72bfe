//! Assembly of multi-period energy system planning models into linear programs.
#![warn(missing_docs)]
pub mod assembly;
pub mod asset;
pub mod cli;
pub mod commodity;
pub mod dsm;
pub mod features;
pub mod finance;
pub mod global;
pub mod id;
pub mod index;
pub mod input;
pub mod log;
pub mod model;
pub mod problem;
pub mod process;
pub mod settings;
pub mod site;
pub mod solver;
pub mod storage;
pub mod time;
pub mod transmission;
pub mod units;

#[cfg(test)]
mod fixture;
