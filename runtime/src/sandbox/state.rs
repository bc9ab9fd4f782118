use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};
use log::trace;
use mlua::{
    ChunkMode, FromLuaMulti, Function, HookTriggers, IntoLuaMulti, Lua, LuaOptions, MultiValue, StdLib,
    String as LuaString, Table, Value, VmState,
};
use crate::sandbox::{SandboxError, SandboxLimits, SandboxResult};

const CHUNK_NAME: &str = "checker.lua";

/// Seed every fresh instance starts from
const RNG_SEED: u64 = 0x7B_01C8;

/// Captured print output is cut off past this size
const STDOUT_LIMIT: usize = 1024 * 1024;

/// Builtins that could reach the filesystem
const DENIED: [&str; 3] = ["dofile", "loadfile", "require"];

/// One isolated Lua interpreter.
///
/// Only the base, math, string and table libraries are loaded. `print`
/// writes into an in-memory buffer, and `random`/`randomseed` (also exposed
/// as `math.random`/`math.randomseed`) draw from a generator local to this
/// instance. Execution is aborted once the current deadline passes.
pub struct Sandbox {
    lua: Lua,
    stdout: Rc<RefCell<Vec<u8>>>,
    deadline: Rc<Cell<Instant>>,
    timed_out: Rc<Cell<bool>>,
}

impl Sandbox {
    /// Create an interpreter whose deadline is `limits.init_timeout` from now
    pub fn new(limits: &SandboxLimits) -> SandboxResult<Self> {
        let lua = Lua::new_with(StdLib::MATH | StdLib::STRING | StdLib::TABLE, LuaOptions::new())?;
        lua.set_memory_limit(limits.memory_limit)?;

        let sandbox = Self {
            lua,
            stdout: Rc::new(RefCell::new(Vec::new())),
            deadline: Rc::new(Cell::new(Instant::now() + limits.init_timeout)),
            timed_out: Rc::new(Cell::new(false)),
        };

        sandbox.install_hook(limits.hook_interval);
        sandbox.install_globals()?;
        Ok(sandbox)
    }

    /// Restart the clock: execution may continue for `timeout` from now
    pub fn set_timeout(&self, timeout: Duration) {
        self.deadline.set(Instant::now() + timeout);
        self.timed_out.set(false);
    }

    /// Parse source into a callable chunk without running it.
    ///
    /// Only text is accepted, so a script cannot smuggle in precompiled code.
    pub fn compile(&self, source: &str) -> SandboxResult<Function> {
        self.lua
            .load(source)
            .set_name(CHUNK_NAME)
            .set_mode(ChunkMode::Text)
            .into_function()
            .map_err(|err| SandboxError::Compile(err.to_string()))
    }

    /// Parse source and dump it as a binary chunk for [`Sandbox::exec_compiled`]
    pub fn precompile(&self, source: &str) -> SandboxResult<Vec<u8>> {
        Ok(self.compile(source)?.dump(false))
    }

    /// Compile and run a chunk so that it registers its globals
    pub fn exec(&self, source: &str) -> SandboxResult<()> {
        let chunk = self.compile(source)?;
        self.call(&chunk, ())
    }

    /// Run a binary chunk produced by [`Sandbox::precompile`]
    pub fn exec_compiled(&self, chunk: &[u8]) -> SandboxResult<()> {
        let chunk = self
            .lua
            .load(chunk)
            .set_name(CHUNK_NAME)
            .set_mode(ChunkMode::Binary)
            .into_function()
            .map_err(|err| SandboxError::Compile(err.to_string()))?;
        self.call(&chunk, ())
    }

    pub fn global(&self, name: &str) -> SandboxResult<Value> {
        self.lua.globals().get::<Value>(name).map_err(|err| self.fault(err))
    }

    /// Look up a global that must be a function
    pub fn function(&self, name: &str) -> SandboxResult<Function> {
        self.lua.globals().get::<Function>(name).map_err(|err| self.fault(err))
    }

    /// Call a function under the current deadline
    pub fn call<R: FromLuaMulti>(&self, function: &Function, args: impl IntoLuaMulti) -> SandboxResult<R> {
        function.call::<R>(args).map_err(|err| self.fault(err))
    }

    /// Create a Lua string from raw bytes
    pub fn create_string(&self, bytes: &[u8]) -> SandboxResult<LuaString> {
        Ok(self.lua.create_string(bytes)?)
    }

    /// Stringify a value the way Lua's `tostring` does
    pub fn to_text(&self, value: Value) -> SandboxResult<String> {
        let tostring = self.function("tostring")?;
        let text: LuaString = self.call(&tostring, value)?;
        Ok(String::from_utf8_lossy(&text.as_bytes()).into_owned())
    }

    /// Everything printed so far
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.stdout.borrow()).into_owned()
    }

    fn fault(&self, err: mlua::Error) -> SandboxError {
        if self.timed_out.get() {
            SandboxError::Timeout
        } else {
            SandboxError::Runtime(err.to_string())
        }
    }

    fn install_hook(&self, interval: u32) {
        let deadline = self.deadline.clone();
        let timed_out = self.timed_out.clone();

        self.lua.set_hook(
            HookTriggers::new().every_nth_instruction(interval.max(1)),
            move |_, _| {
                if Instant::now() >= deadline.get() {
                    timed_out.set(true);
                    return Err(mlua::Error::runtime("execution timed out"));
                }
                Ok(VmState::Continue)
            },
        );
    }

    fn install_globals(&self) -> mlua::Result<()> {
        let lua = &self.lua;
        let globals = lua.globals();

        for name in DENIED {
            let deny = lua.create_function(move |_, _: MultiValue| -> mlua::Result<()> {
                Err(mlua::Error::runtime(format!("function {} is not available", name)))
            })?;
            globals.set(name, deny)?;
        }
        globals.set("collectgarbage", Value::Nil)?;

        let rng = Rc::new(RefCell::new(fastrand::Rng::with_seed(RNG_SEED)));

        let random = {
            let rng = rng.clone();
            lua.create_function(move |_, (low, high): (Option<i64>, Option<i64>)| {
                let mut rng = rng.borrow_mut();
                match (low, high) {
                    (None, _) => Ok(Value::Number(rng.f64())),
                    (Some(n), None) => sample(&mut rng, 1, n).map(Value::Integer),
                    (Some(m), Some(n)) => sample(&mut rng, m, n).map(Value::Integer),
                }
            })?
        };

        let randomseed = lua.create_function(move |_, seed: i64| {
            *rng.borrow_mut() = fastrand::Rng::with_seed(seed as u64);
            Ok(())
        })?;

        globals.set("random", random.clone())?;
        globals.set("randomseed", randomseed.clone())?;

        let math: Table = globals.get("math")?;
        math.set("random", random)?;
        math.set("randomseed", randomseed)?;

        let stdout = self.stdout.clone();
        let print = lua.create_function(move |lua, args: MultiValue| {
            let tostring: Function = lua.globals().get("tostring")?;

            let mut line = Vec::new();
            for (index, value) in args.into_iter().enumerate() {
                if index > 0 {
                    line.push(b' ');
                }
                let text: LuaString = tostring.call(value)?;
                line.extend_from_slice(&text.as_bytes());
            }
            line.push(b'\n');

            let mut stdout = stdout.borrow_mut();
            let room = STDOUT_LIMIT.saturating_sub(stdout.len());
            if room < line.len() {
                trace!("sandbox output truncated at {} bytes", STDOUT_LIMIT);
            }
            stdout.extend_from_slice(&line[..line.len().min(room)]);
            Ok(())
        })?;
        globals.set("print", print)?;

        Ok(())
    }
}

fn sample(rng: &mut fastrand::Rng, low: i64, high: i64) -> mlua::Result<i64> {
    if low > high {
        return Err(mlua::Error::runtime("bad argument to 'random' (interval is empty)"));
    }
    Ok(rng.i64(low..=high))
}
