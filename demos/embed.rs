//! End-to-end demo: create a JVM inside this process and call into it.
//!
//! Needs a JDK on the machine; set `JAVA_HOME` or `JVM_LIB_PATH` if the
//! automatic search cannot find `libjvm`.
//!
//! ```bash
//! cargo run --example embed
//! ```

use jbridge::prelude::*;

fn main() -> Result<()> {
    let mut bridge = JavaBridge::new();

    // Reuse a VM if some other component already created one.
    if !bridge.attach_vm()? {
        bridge.create_vm(VmOptions::new().option("-Xmx64m")?)?;
    }
    println!("JNI version: 0x{:08x}", bridge.version()?);

    // Static dispatch: no target object.
    let version = bridge.invoke(
        "java/lang/System",
        None,
        "getProperty",
        "(Ljava/lang/String;)Ljava/lang/String;",
        &[HostValue::Text("java.version".into())],
    )?;
    println!("guest java.version = {version:?}");

    // Instance dispatch: construct, then invoke on the handle.
    let sb = bridge.construct(
        "java/lang/StringBuilder",
        "(Ljava/lang/String;)V",
        &[HostValue::Text("hello from ".into())],
    )?;
    bridge.invoke(
        "java/lang/StringBuilder",
        Some(sb),
        "append",
        "(Ljava/lang/String;)Ljava/lang/StringBuilder;",
        &[HostValue::Text("rust".into())],
    )?;
    let rendered = bridge.invoke(
        "java/lang/StringBuilder",
        Some(sb),
        "toString",
        "()Ljava/lang/String;",
        &[],
    )?;
    println!("built: {rendered:?}");

    bridge.dispose()
}
