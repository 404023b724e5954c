//! Unit registry: wraps plain functions into orchestrator-callable units.
//!
//! Units can be defined anywhere, in any order; [`UnitRegistry::attach`]
//! registers the accumulated set with an engine in declaration order,
//! decoupling unit definition from the bootstrap sequence.

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use durapipe_protocols::error::{ActivityError, ContextError, RegistryError, WorkflowError};
use durapipe_protocols::{
    ActivityContext, ActivityHandler, ActivityRegistration, TaskHandle, Transport,
    UnitRegistryAccess, WorkflowContext, WorkflowHandler, WorkflowRegistration,
};

use crate::context;

/// Accumulates wrapped workflow and activity units for bulk registration.
pub struct UnitRegistry {
    workflows: Mutex<Vec<WorkflowRegistration>>,
    activities: Mutex<Vec<ActivityRegistration>>,
}

impl UnitRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            workflows: Mutex::new(Vec::new()),
            activities: Mutex::new(Vec::new()),
        }
    }

    /// Wrap and record a workflow function.
    ///
    /// The wrapped handler installs the engine-provided context in the
    /// execution-scoped slot on every invocation (including replays) before
    /// running the body, so activity stubs called anywhere in the body can
    /// find it.
    pub fn workflow<F, Fut>(
        &self,
        name: impl Into<String>,
        func: F,
    ) -> Result<WorkflowStub, RegistryError>
    where
        F: Fn(Arc<dyn WorkflowContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, WorkflowError>> + Send + 'static,
    {
        let name = name.into();
        let mut workflows = self.workflows.lock();
        if workflows.iter().any(|reg| reg.name == name) {
            return Err(RegistryError::Duplicate(name));
        }
        workflows.push(WorkflowRegistration {
            name: name.clone(),
            handler: Arc::new(WorkflowFn { func }),
        });
        Ok(WorkflowStub { name })
    }

    /// Wrap and record an activity function over a typed entity.
    ///
    /// Produces the registrable form (reconstructs the entity from transport
    /// form before calling `func`; reconstruction failure fails the handle)
    /// and returns the call-site stub.
    pub fn activity<I, F, Fut>(
        &self,
        name: impl Into<String>,
        func: F,
    ) -> Result<ActivityStub<I>, RegistryError>
    where
        I: Transport + Send + 'static,
        F: Fn(ActivityContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ActivityError>> + Send + 'static,
    {
        let name = self.record_activity(
            name.into(),
            Arc::new(ActivityFn {
                func,
                _marker: PhantomData::<fn(&I)>,
            }),
        )?;
        Ok(ActivityStub {
            name,
            _marker: PhantomData,
        })
    }

    /// Wrap and record an activity function over the opaque transport value.
    ///
    /// No reconstruction happens at the boundary - reduced guarantees for
    /// inputs that are not recognized structured entities.
    pub fn activity_raw<F, Fut>(
        &self,
        name: impl Into<String>,
        func: F,
    ) -> Result<RawActivityStub, RegistryError>
    where
        F: Fn(ActivityContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ActivityError>> + Send + 'static,
    {
        let name = self.record_activity(name.into(), Arc::new(RawActivityFn { func }))?;
        Ok(RawActivityStub { name })
    }

    fn record_activity(
        &self,
        name: String,
        handler: Arc<dyn ActivityHandler>,
    ) -> Result<String, RegistryError> {
        let mut activities = self.activities.lock();
        if activities.iter().any(|reg| reg.name == name) {
            return Err(RegistryError::Duplicate(name));
        }
        activities.push(ActivityRegistration {
            name: name.clone(),
            handler,
        });
        Ok(name)
    }

    /// Register every accumulated unit with the engine, in declaration order.
    pub fn attach(&self, engine: &dyn UnitRegistryAccess) -> Result<(), RegistryError> {
        for registration in self.workflows.lock().iter() {
            engine.register_workflow(registration.clone())?;
        }
        for registration in self.activities.lock().iter() {
            engine.register_activity(registration.clone())?;
        }
        Ok(())
    }

    /// Number of recorded workflow units.
    pub fn workflow_count(&self) -> usize {
        self.workflows.lock().len()
    }

    /// Number of recorded activity units.
    pub fn activity_count(&self) -> usize {
        self.activities.lock().len()
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Call-site stub for a registered workflow. Carries the registered name the
/// engine starts runs by.
#[derive(Debug, Clone)]
pub struct WorkflowStub {
    name: String,
}

impl WorkflowStub {
    /// The registered workflow name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Call-site stub for a registered activity over a typed entity.
///
/// Calling the stub looks like a local function call; the framework lowers
/// the entity to transport form and asks the engine to schedule the
/// registered handler, returning the pending handle.
#[derive(Debug)]
pub struct ActivityStub<I> {
    name: String,
    _marker: PhantomData<fn(&I)>,
}

impl<I: Transport> ActivityStub<I> {
    /// The registered activity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schedule the activity with the given input.
    ///
    /// Fails with [`ContextError::NotSet`] when called outside an active
    /// workflow execution, before any engine interaction.
    pub fn call(&self, input: &I) -> Result<TaskHandle, ContextError> {
        let ctx = context::current()?;
        Ok(ctx.call_activity(&self.name, input.to_transport()))
    }
}

impl<I> Clone for ActivityStub<I> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

/// Call-site stub for a raw activity over the opaque transport value.
#[derive(Debug, Clone)]
pub struct RawActivityStub {
    name: String,
}

impl RawActivityStub {
    /// The registered activity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schedule the activity with an untyped payload.
    pub fn call(&self, input: Value) -> Result<TaskHandle, ContextError> {
        let ctx = context::current()?;
        Ok(ctx.call_activity(&self.name, input))
    }
}

struct WorkflowFn<F> {
    func: F,
}

#[async_trait]
impl<F, Fut> WorkflowHandler for WorkflowFn<F>
where
    F: Fn(Arc<dyn WorkflowContext>, Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, WorkflowError>> + Send,
{
    async fn run(
        &self,
        ctx: Arc<dyn WorkflowContext>,
        input: Value,
    ) -> Result<Value, WorkflowError> {
        context::scope(ctx.clone(), (self.func)(ctx, input)).await
    }
}

struct ActivityFn<F, I> {
    func: F,
    _marker: PhantomData<fn(&I)>,
}

#[async_trait]
impl<F, Fut, I> ActivityHandler for ActivityFn<F, I>
where
    I: Transport + Send,
    F: Fn(ActivityContext, I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ActivityError>> + Send,
{
    async fn run(&self, ctx: ActivityContext, input: Value) -> Result<Value, ActivityError> {
        let typed = I::from_transport(input)?;
        (self.func)(ctx, typed).await
    }
}

struct RawActivityFn<F> {
    func: F,
}

#[async_trait]
impl<F, Fut> ActivityHandler for RawActivityFn<F>
where
    F: Fn(ActivityContext, Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ActivityError>> + Send,
{
    async fn run(&self, ctx: ActivityContext, input: Value) -> Result<Value, ActivityError> {
        (self.func)(ctx, input).await
    }
}
