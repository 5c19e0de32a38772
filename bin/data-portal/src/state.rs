// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use portal::Session;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handler state. Reads take the read lock; uploads and computations
/// that store a result take the write lock. Polars work runs on the blocking
/// pool with the guard moved into the task.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<Session>>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }
}
