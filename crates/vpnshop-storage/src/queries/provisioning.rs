// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Legacy per-order slave node assignment.

use rusqlite::params;
use vpnshop_core::types::{NewProvisioningJob, ProvisioningJob};
use vpnshop_core::VpnshopError;

use crate::database::{map_tr_err, Database};

/// Insert-or-ignore keyed by `order_id`, then read back the surviving row.
pub async fn create_or_get_provisioning_job(
    db: &Database,
    job: &NewProvisioningJob,
) -> Result<ProvisioningJob, VpnshopError> {
    let job = job.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO provisioning_jobs
                     (order_id, tg_id, server, protocol, slave_node, status, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(order_id) DO NOTHING",
                params![
                    job.order_id,
                    job.tg_id,
                    job.server,
                    job.protocol,
                    job.slave_node,
                    job.status,
                    job.notes,
                ],
            )?;
            conn.query_row(
                "SELECT id, order_id, tg_id, server, protocol, slave_node, status, config_stub
                 FROM provisioning_jobs WHERE order_id = ?1",
                params![job.order_id],
                |row| {
                    Ok(ProvisioningJob {
                        id: row.get(0)?,
                        order_id: row.get(1)?,
                        tg_id: row.get(2)?,
                        server: row.get(3)?,
                        protocol: row.get(4)?,
                        slave_node: row.get(5)?,
                        status: row.get(6)?,
                        config_stub: row.get(7)?,
                    })
                },
            )
        })
        .await
        .map_err(map_tr_err)
}
