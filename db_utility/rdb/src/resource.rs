/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! Resource release module
//! Closes batches of resources in reverse acquisition order

use std::fmt::Debug;
use log::{debug, error};
use crate::error::BoxError;
use crate::DbError;

/// Handle that can be released.
///
/// The `Debug` rendering identifies the resource when releasing it fails.
pub trait Closeable: Debug {
    fn close(&mut self) -> Result<(), BoxError>;
}

impl<T: Closeable + ?Sized> Closeable for Box<T> {
    fn close(&mut self) -> Result<(), BoxError> {
        (**self).close()
    }
}

/// Release a batch, last resource first, stopping at the first failure.
///
/// `None` slots are skipped. Every released slot is reset to `None`, so on
/// failure the batch still holds the failing resource and those that were
/// not reached yet.
///
/// # Errors
///
/// * `DbError::NoResourcesProvided` - If the batch is empty; nothing is released.
/// * `DbError::ResourceReleaseError` - For the first resource that fails to close.
///
/// # Example
/// ```no_run
/// use rdb::{open, release};
///
/// let mut conn = open().unwrap();
/// conn.execute("UPDATE account SET active = 1").unwrap();
/// conn.commit().unwrap();
/// release(&mut [Some(&mut conn as &mut dyn rdb::Closeable)]).unwrap();
/// ```
pub fn release(resources: &mut [Option<&mut dyn Closeable>]) -> Result<(), DbError> {
    if resources.is_empty() {
        error!("release called without any resource");
        return Err(DbError::NoResourcesProvided);
    }

    for (index, slot) in resources.iter_mut().enumerate().rev() {
        if let Some(resource) = slot.as_mut() {
            close_one(index, &mut **resource)?;
            *slot = None;
        } else {
            debug!("resource #{} absent, skipped", index);
        }
    }
    Ok(())
}

/// Release every resource of a batch, last first, and report all failures.
///
/// Failed resources stay in their slots; released ones are reset to `None`.
/// Failures are returned in the order they happened.
pub fn release_all(resources: &mut [Option<&mut dyn Closeable>]) -> Result<(), Vec<DbError>> {
    if resources.is_empty() {
        error!("release called without any resource");
        return Err(vec![DbError::NoResourcesProvided]);
    }

    let mut failures = Vec::new();
    for (index, slot) in resources.iter_mut().enumerate().rev() {
        let Some(resource) = slot.as_mut() else {
            continue;
        };
        match close_one(index, &mut **resource) {
            Ok(()) => *slot = None,
            Err(e) => failures.push(e),
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

fn close_one(index: usize, resource: &mut dyn Closeable) -> Result<(), DbError> {
    debug!("releasing resource #{}: {:?}", index, resource);
    resource.close().map_err(|source| {
        let resource = format!("{:?}", resource);
        error!("failed to release resource #{} ({}): {}", index, resource, source);
        DbError::ResourceReleaseError { index, resource, source }
    })
}

/// Variadic form of [`release`](crate::release()).
///
/// Every argument must be a place implementing [`Closeable`]; it is
/// borrowed mutably for the call. `release!()` reports
/// `DbError::NoResourcesProvided`.
///
/// ```no_run
/// let mut conn = rdb::open().unwrap();
/// rdb::release!(conn).unwrap();
/// ```
#[macro_export]
macro_rules! release {
    () => {
        $crate::release(&mut [])
    };
    ($($resource:expr),+ $(,)?) => {
        $crate::release(&mut [$(::std::option::Option::Some(&mut $resource as &mut dyn $crate::Closeable)),+])
    };
}
