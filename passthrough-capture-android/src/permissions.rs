//! Camera permission gate through the hosting `Activity`.

use jni::objects::{GlobalRef, JObject, JValue};
use jni::sys::jobject;
use jni::JavaVM;

use passthrough_capture_core::models::error::CaptureError;
use passthrough_capture_core::traits::host_context::HostContext;

use crate::error::NdkError;

const CAMERA_PERMISSION: &str = "android.permission.CAMERA";
const PERMISSION_REQUEST_CODE: i32 = 1234;
const PERMISSION_GRANTED: i32 = 0;

/// Host context backed by a Java `Activity`.
pub struct AndroidHost {
    vm: JavaVM,
    activity: GlobalRef,
}

impl AndroidHost {
    pub fn new(vm: JavaVM, activity: GlobalRef) -> Self {
        Self { vm, activity }
    }

    /// Wraps a raw activity reference handed over by the engine. The
    /// reference is promoted to a global one, so the caller's local
    /// reference may go out of scope afterwards.
    ///
    /// # Safety
    ///
    /// `activity` must be a valid reference to an `android.app.Activity`.
    pub unsafe fn from_activity(vm: JavaVM, activity: jobject) -> Result<Self, NdkError> {
        let global = {
            let env = vm.attach_current_thread()?;
            let local = JObject::from_raw(activity);
            env.new_global_ref(&local)?
        };
        Ok(Self::new(vm, global))
    }

    /// Uses the VM and activity registered with `ndk-context` by the
    /// native activity glue.
    pub fn from_ndk_context() -> Result<Self, NdkError> {
        let ctx = ndk_context::android_context();
        if ctx.vm().is_null() || ctx.context().is_null() {
            return Err(NdkError::Jni("android context not initialized".into()));
        }
        // SAFETY: ndk-context hands out the process VM and the activity
        // object it was initialized with.
        unsafe {
            let vm = JavaVM::from_raw(ctx.vm().cast())?;
            Self::from_activity(vm, ctx.context().cast())
        }
    }

    fn check_permission(&self) -> Result<bool, NdkError> {
        let mut env = self.vm.attach_current_thread()?;
        let permission = env.new_string(CAMERA_PERMISSION)?;
        let result = env.call_method(
            self.activity.as_obj(),
            "checkSelfPermission",
            "(Ljava/lang/String;)I",
            &[JValue::Object(&permission)],
        );
        if env.exception_check()? {
            env.exception_clear()?;
        }
        Ok(result?.i()? == PERMISSION_GRANTED)
    }

    fn request_permission(&self) -> Result<(), NdkError> {
        let mut env = self.vm.attach_current_thread()?;
        let permission = env.new_string(CAMERA_PERMISSION)?;
        let permissions = env.new_object_array(1, "java/lang/String", &permission)?;
        let result = env.call_method(
            self.activity.as_obj(),
            "requestPermissions",
            "([Ljava/lang/String;I)V",
            &[JValue::Object(&permissions), JValue::Int(PERMISSION_REQUEST_CODE)],
        );
        if env.exception_check()? {
            env.exception_clear()?;
        }
        result?;
        Ok(())
    }
}

impl HostContext for AndroidHost {
    fn has_camera_permission(&self) -> bool {
        match self.check_permission() {
            Ok(granted) => granted,
            Err(e) => {
                log::error!("Permission check failed: {}", e);
                false
            }
        }
    }

    fn request_camera_permission(&self) -> Result<(), CaptureError> {
        self.request_permission().map_err(CaptureError::from)
    }
}
