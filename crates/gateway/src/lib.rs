// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Storefront API Gateway
//!
//! Routes logical REST calls either to static mock fixtures or to the live
//! storefront backend, behind one calling convention.
//!
//! # Architecture
//!
//! - [`router`]: route table and the two-pass mock resolver
//! - [`dispatcher`]: mock and live dispatch strategies
//! - [`gateway`]: the [`ApiGateway`] entry point used by page managers
//! - [`response`]: normalized response shape shared by both modes
//! - [`session`]: session store and the advisory session hint
//! - [`identity`]: hosted-UI sign-in / sign-up / sign-out links
//! - [`config`]: configuration loading and validation

pub mod config;
pub mod dispatcher;
pub mod gateway;
pub mod identity;
pub mod response;
pub mod router;
pub mod session;

pub use config::{ApiConfig, IdentityConfig, StorefrontConfig};
pub use dispatcher::{DispatchMode, Dispatcher, FixtureSource, HttpDispatcher, MockDispatcher};
pub use gateway::{ApiGateway, GatewayError, RequestOptions};
pub use identity::{HostedUi, IdentityError};
pub use response::{ApiResponse, FixtureResponse, NetworkResponse, ResponseLike};
pub use router::{FixtureId, HttpMethod, RouteDescriptor, RouteError, RouteTable};
pub use session::{FileSessionStore, MemorySessionStore, SessionHint, SessionStore};
