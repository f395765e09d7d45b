//! A complete example showing how to dispatch units of work with Exertion.
//!
//! This example demonstrates:
//! - Implementing a provider and a discovery service
//! - Evaluating a single remote task
//! - Running a job whose children depend on each other
//! - Running local object tasks inside a block
//! - Inspecting the trace of a failed unit

use async_trait::async_trait;
use exertion::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Step 1: A provider
// ============================================================================

/// Does arithmetic on the `arg/x1` and `arg/x2` entries of whatever it receives.
struct Arithmetic {
    id: Uuid,
}

fn int(cxt: &Context, path: &str) -> i64 {
    cxt.get_value(path).and_then(|v| v.as_i64()).unwrap_or(0)
}

#[async_trait]
impl Provider for Arithmetic {
    fn name(&self) -> &str {
        "arithmetic"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn exert(
        &self,
        mut mogram: Mogram,
        _txn: Option<&Transaction>,
        _args: &[Arg],
    ) -> Result<Option<Mogram>, RemoteError> {
        let Some(selector) = mogram.process_signature().map(|s| s.selector().to_string()) else {
            return Err(RemoteError::Invocation("no process signature".into()));
        };
        let cxt = mogram.context();
        let (x1, x2) = (int(cxt, "arg/x1"), int(cxt, "arg/x2"));
        let result = match selector.as_str() {
            "add" => x1 + x2,
            "multiply" => x1 * x2,
            "subtract" => x1 - x2,
            other => {
                mogram.report_exception(Fault::exception(format!("unknown operation '{other}'")));
                return Ok(Some(mogram));
            }
        };
        println!("[Arithmetic] {selector}({x1}, {x2}) = {result}");
        mogram.context_mut().put_value("result", result);
        Ok(Some(mogram))
    }
}

// ============================================================================
// Step 2: A discovery service
// ============================================================================

/// Every provider is registered under the service types it implements.
#[derive(Default)]
struct Registry {
    providers: HashMap<String, ProviderHandle>,
}

impl Registry {
    fn register(mut self, service_type: &str, provider: Arc<dyn Provider>) -> Self {
        self.providers
            .insert(service_type.to_string(), ProviderHandle::Provider(provider));
        self
    }
}

#[async_trait]
impl Discovery for Registry {
    async fn find_provider(&self, signature: &Signature) -> Result<Option<ProviderHandle>, RemoteError> {
        Ok(self.providers.get(signature.service_type()).cloned())
    }
}

// ============================================================================
// Step 3: Local logic
// ============================================================================

fn scale(_selector: &str, cxt: &mut Context) -> Result<(), Fault> {
    let value = int(cxt, "result");
    cxt.put_value("scaled", value * 10);
    Ok(())
}

fn report(_selector: &str, cxt: &mut Context) -> Result<(), Fault> {
    println!("[Report] scaled = {}", int(cxt, "scaled"));
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), DispatchError> {
    println!("=== Exertion Basic Dispatch Example ===\n");

    let arithmetic: Arc<dyn Provider> = Arc::new(Arithmetic { id: Uuid::new_v4() });
    let registry = Registry::default()
        .register("Adder", arithmetic.clone())
        .register("Multiplier", arithmetic.clone())
        .register("Subtractor", arithmetic);
    let shell = Shell::new(Arc::new(registry));

    println!("--- Example 1: A single task ---");
    let mut add: Mogram = Task::new("add", Signature::net("add", "Adder"))
        .with_context(Context::new("add").with("arg/x1", 20).with("arg/x2", 80))
        .into();
    let result = shell
        .evaluate(&mut add, &[Arg::RequestPath(RequestPath::outputs(["result"]))])
        .await?;
    println!("Result: {:?}\n", result.as_value());

    println!("--- Example 2: A job with dependencies ---");
    let job: Mogram = Job::new("f1")
        .with_child(
            Task::new("subtract", Signature::net("subtract", "Subtractor"))
                .with_context(Context::new("subtract").with("arg/x1", 500).with("arg/x2", 100)),
        )
        .with_child(
            Task::new("multiply", Signature::net("multiply", "Multiplier"))
                .with_context(Context::new("multiply").with("arg/x1", 10).with("arg/x2", 50)),
        )
        .with_dependency("subtract", "multiply")
        .into();
    let job = shell.exert(job, None, &[]).await;
    println!("Job '{}' ended {:?}", job.name(), job.status());
    for child in job.children() {
        println!("  {}: {:?}", child.name(), child.context().get_value("result"));
    }

    println!("\n--- Example 3: A block of local steps ---");
    let block: Mogram = Block::new("pipeline")
        .with_context(Context::new("pipeline").with("result", 7))
        .with_child(Task::new("scale", Signature::object("scale", "Scaler", scale)))
        .with_child(Task::new("report", Signature::object("report", "Reporter", report)))
        .into();
    let block = shell.exert(block, None, &[]).await;
    println!("Block '{}' ended {:?}", block.name(), block.status());

    println!("\n--- Example 4: A failing task ---");
    let mut divide: Mogram = Task::new("divide", Signature::net("divide", "Adder")).into();
    match shell.evaluate(&mut divide, &[]).await? {
        Evaluation::Trace(faults) => {
            for fault in faults {
                println!("  fault: {}", fault);
            }
        }
        other => println!("Unexpected result: {:?}", other),
    }

    println!("\n=== Dispatch completed ===");
    Ok(())
}
